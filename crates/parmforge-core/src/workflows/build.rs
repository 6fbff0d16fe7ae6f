use crate::core::forcefield::library::ForceField;
use crate::core::forcefield::template::ResidueTemplate;
use crate::core::forcefield::types::AtomType;
use crate::core::models::element::Element;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::topology::Topology;
use crate::core::utils::geometry::triangle_third_side;
use crate::core::utils::parallel::IntoParallelRefIterator;
#[cfg(feature = "parallel")]
use crate::core::utils::parallel::ParallelIterator;
use crate::engine::config::{BuildConfig, ConstraintLevel};
use crate::engine::error::{BuildError, describe_residue};
use crate::engine::matcher::{self, MatchResult};
use crate::engine::signature::residue_signature;
use crate::engine::system::{
    AngleTerm, BondTerm, Constraint, NonbondedParticle, NonbondedSettings, System, SystemSink,
    TorsionKind, TorsionTerm,
};
use crate::engine::unmatched;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

/// Builds a recording [`System`] from the topology.
///
/// Convenience wrapper around [`build_into`] with the library's own sink.
pub fn create_system(
    forcefield: &mut ForceField,
    topology: &Topology,
    config: &BuildConfig,
) -> Result<System, BuildError> {
    let mut system = System::new();
    build_into(forcefield, topology, config, &mut system)?;
    Ok(system)
}

/// Parameterizes the topology and emits the result into the sink.
///
/// The force field is borrowed mutably for the whole build: registries stay
/// immutable except for template registration performed by hooks, which run
/// serialized on this thread. Any fatal condition aborts with no partial
/// system; unmatched residues are accumulated first so a single error lists
/// them all.
#[instrument(skip_all, name = "build_workflow")]
pub fn build_into(
    forcefield: &mut ForceField,
    topology: &Topology,
    config: &BuildConfig,
    sink: &mut dyn SystemSink,
) -> Result<(), BuildError> {
    // === Phase 1: Match every residue against the template library ===
    info!(
        residues = topology.residue_count(),
        templates = forcefield.templates().len(),
        "Starting template matching."
    );
    let mut matches = match_all(forcefield, topology);

    // === Phase 2: Template-generator hooks for unmatched structures ===
    run_hook_pipeline(forcefield, topology, &mut matches);

    // === Phase 3: Fail on residues still unmatched or ambiguous ===
    let assignments = finalize_matches(topology, &matches)?;

    // === Phase 4: Emit particles, interactions, constraints, settings ===
    assemble(forcefield, topology, config, &assignments, sink)
}

/// Lists residues no registered template matches, in topology order.
///
/// Template-generator hooks are not invoked; this is a read-only pre-check
/// of the registry as it stands.
pub fn unmatched_residues(forcefield: &ForceField, topology: &Topology) -> Vec<ResidueId> {
    match_all(forcefield, topology)
        .into_iter()
        .filter_map(|(residue_id, result)| {
            matches!(result, MatchResult::NoMatch).then_some(residue_id)
        })
        .collect()
}

/// Returns the matching template for every residue, in topology order.
///
/// # Errors
///
/// Fails like a build would: all unmatched residues are reported at once,
/// and an ambiguous residue is an error rather than an arbitrary pick.
pub fn matching_templates<'a>(
    forcefield: &'a ForceField,
    topology: &Topology,
) -> Result<Vec<&'a ResidueTemplate>, BuildError> {
    let matches = match_all(forcefield, topology);
    let assignments = finalize_matches(topology, &matches)?;
    Ok(matches
        .iter()
        .map(|(residue_id, _)| &forcefield.templates()[assignments[residue_id].0])
        .collect())
}

/// Generates one structural template per distinct unmatched structure.
///
/// Returns the deduplicated templates alongside one exemplar residue each;
/// N structurally identical unmatched residues contribute a single entry.
/// The templates carry uniquely named placeholder atom types and no
/// interaction parameters (see [`unmatched::generate_template`]).
pub fn generate_templates_for_unmatched_residues(
    forcefield: &ForceField,
    topology: &Topology,
) -> (Vec<ResidueTemplate>, Vec<ResidueId>) {
    let unmatched_ids = unmatched_residues(forcefield, topology);
    let groups = unmatched::deduplicate(topology, &unmatched_ids);
    let templates = groups.iter().map(|group| group.template().clone()).collect();
    let exemplars = groups.iter().map(|group| group.exemplar).collect();
    (templates, exemplars)
}

/// Matches all residues. Read-only over topology and registries, so the
/// per-residue work is dispatched through the parallel shim.
fn match_all(forcefield: &ForceField, topology: &Topology) -> Vec<(ResidueId, MatchResult)> {
    let residue_ids: Vec<ResidueId> = topology.residues_in_order().collect();
    let templates = forcefield.templates();
    let results: Vec<MatchResult> = residue_ids
        .par_iter()
        .map(|&residue_id| matcher::match_residue(topology, residue_id, templates))
        .collect();
    residue_ids.into_iter().zip(results).collect()
}

/// Runs the hook pipeline for unmatched residues.
///
/// Hooks are invoked once per distinct structure, in registration order,
/// serialized on the calling thread. After a hook reports success, every
/// residue sharing the structure's signature is re-matched — including
/// residues matched speculatively during the parallel phase, since a newly
/// registered template could apply to them too.
fn run_hook_pipeline(
    forcefield: &mut ForceField,
    topology: &Topology,
    matches: &mut [(ResidueId, MatchResult)],
) {
    if forcefield.template_generator_count() == 0 {
        return;
    }
    let unmatched_ids: Vec<ResidueId> = matches
        .iter()
        .filter(|(_, result)| matches!(result, MatchResult::NoMatch))
        .map(|(residue_id, _)| *residue_id)
        .collect();
    if unmatched_ids.is_empty() {
        return;
    }

    let groups = unmatched::deduplicate(topology, &unmatched_ids);
    info!(
        residues = unmatched_ids.len(),
        structures = groups.len(),
        "Invoking template generators for unmatched structures."
    );

    let signatures: HashMap<ResidueId, String> = matches
        .iter()
        .map(|(residue_id, _)| (*residue_id, residue_signature(topology, *residue_id)))
        .collect();

    let mut hooks = forcefield.take_template_generators();
    for group in &groups {
        let handled = hooks
            .iter_mut()
            .any(|hook| hook(forcefield, topology, group.exemplar));
        if !handled {
            warn!(
                residue = %describe_residue(topology, group.exemplar),
                "No template generator accepted the structure."
            );
            continue;
        }
        for (residue_id, result) in matches.iter_mut() {
            if signatures[residue_id] == group.signature {
                *result = matcher::match_residue(topology, *residue_id, forcefield.templates());
            }
        }
    }
    forcefield.restore_template_generators(hooks);
}

/// Splits match results into assignments and fatal conditions.
fn finalize_matches(
    topology: &Topology,
    matches: &[(ResidueId, MatchResult)],
) -> Result<HashMap<ResidueId, (usize, Vec<usize>)>, BuildError> {
    let mut assignments = HashMap::with_capacity(matches.len());
    let mut unmatched_descriptions = Vec::new();
    let mut ambiguous: Option<BuildError> = None;

    for (residue_id, result) in matches {
        match result {
            MatchResult::Matched { template, mapping } => {
                assignments.insert(*residue_id, (*template, mapping.clone()));
            }
            MatchResult::NoMatch => {
                unmatched_descriptions.push(describe_residue(topology, *residue_id));
            }
            MatchResult::Ambiguous { candidates } => {
                if ambiguous.is_none() {
                    ambiguous = Some(BuildError::AmbiguousTemplate {
                        residue: describe_residue(topology, *residue_id),
                        candidates: candidates.clone(),
                    });
                }
            }
        }
    }

    if !unmatched_descriptions.is_empty() {
        return Err(BuildError::UnmatchedResidues {
            residues: unmatched_descriptions,
        });
    }
    if let Some(error) = ambiguous {
        return Err(error);
    }
    Ok(assignments)
}

/// One fully typed particle, in topology order.
struct Particle<'a> {
    atom_id: AtomId,
    residue_id: ResidueId,
    element: Option<Element>,
    atom_type: &'a AtomType,
    template_charge: Option<f64>,
}

fn assemble(
    forcefield: &ForceField,
    topology: &Topology,
    config: &BuildConfig,
    assignments: &HashMap<ResidueId, (usize, Vec<usize>)>,
    sink: &mut dyn SystemSink,
) -> Result<(), BuildError> {
    // --- Particle table in topology order ---
    let mut particles: Vec<Particle> = Vec::with_capacity(topology.atom_count());
    let mut particle_index: HashMap<AtomId, usize> = HashMap::with_capacity(topology.atom_count());
    for residue_id in topology.residues_in_order() {
        let residue = topology.residue(residue_id).unwrap();
        let (template_index, mapping) = &assignments[&residue_id];
        let template = &forcefield.templates()[*template_index];
        for (local, &atom_id) in residue.atoms().iter().enumerate() {
            let template_atom = &template.atoms()[mapping[local]];
            // Registration guarantees every template atom type exists.
            let atom_type = forcefield.atom_type(&template_atom.type_name).unwrap();
            particle_index.insert(atom_id, particles.len());
            particles.push(Particle {
                atom_id,
                residue_id,
                element: topology.atom(atom_id).unwrap().element,
                atom_type,
                template_charge: template_atom.charge,
            });
        }
    }

    // --- Masses, with optional hydrogen-mass repartitioning ---
    let mut masses: Vec<f64> = particles
        .iter()
        .map(|particle| particle.atom_type.mass)
        .collect();
    if let Some(hydrogen_mass) = config.hydrogen_mass {
        repartition_hydrogen_mass(topology, &particles, &particle_index, hydrogen_mass, &mut masses);
    }
    for &mass in &masses {
        sink.add_particle(mass);
    }

    // --- Nonbonded settings and per-particle parameters ---
    let nonbonded = forcefield
        .nonbonded_generator()
        .ok_or(BuildError::MissingNonbondedGenerator)?;
    sink.set_nonbonded_settings(NonbondedSettings {
        method: config.nonbonded_method,
        cutoff: config.cutoff,
        dispersion_correction: config.dispersion_correction,
        coulomb14_scale: nonbonded.coulomb14_scale,
        lj14_scale: nonbonded.lj14_scale,
    });
    for particle in &particles {
        let rule = nonbonded.resolve(particle.atom_type).ok_or_else(|| {
            BuildError::UnresolvedNonbonded {
                type_name: particle.atom_type.name.clone(),
            }
        })?;
        let charge = if nonbonded.charge_from_residue {
            particle.template_charge
        } else {
            rule.charge
        };
        let charge = charge.ok_or_else(|| BuildError::MissingCharge {
            residue: describe_residue(topology, particle.residue_id),
            atom: topology.atom(particle.atom_id).unwrap().name.clone(),
        })?;
        sink.add_nonbonded_particle(NonbondedParticle {
            charge,
            sigma: rule.sigma,
            epsilon: rule.epsilon,
        });
    }

    // --- Rigid water: fully constrained triangles ---
    let rigid_water_list: Vec<ResidueId> = if config.rigid_water {
        topology
            .residues_in_order()
            .filter(|&residue_id| water_atoms(topology, residue_id).is_some())
            .collect()
    } else {
        Vec::new()
    };
    let rigid_water: HashSet<ResidueId> = rigid_water_list.iter().copied().collect();

    for &residue_id in &rigid_water_list {
        let (oxygen, h1, h2) = water_atoms(topology, residue_id).unwrap();
        let o_type = particles[particle_index[&oxygen]].atom_type;
        let h1_type = particles[particle_index[&h1]].atom_type;
        let h2_type = particles[particle_index[&h2]].atom_type;

        let bonds = forcefield.bond_generator();
        let first = bonds.resolve(o_type, h1_type);
        let second = bonds.resolve(o_type, h2_type);
        let angle = forcefield.angle_generator().resolve(h1_type, o_type, h2_type);
        let (Some(first), Some(second), Some(angle)) = (first, second, angle) else {
            return Err(BuildError::MissingWaterParameters {
                residue: describe_residue(topology, residue_id),
            });
        };

        sink.add_constraint(Constraint {
            atom1: particle_index[&oxygen],
            atom2: particle_index[&h1],
            distance: first.length,
        });
        sink.add_constraint(Constraint {
            atom1: particle_index[&oxygen],
            atom2: particle_index[&h2],
            distance: second.length,
        });
        sink.add_constraint(Constraint {
            atom1: particle_index[&h1],
            atom2: particle_index[&h2],
            distance: triangle_third_side(first.length, second.length, angle.angle),
        });
    }

    // --- Bonds: terms or constraints per the configured level ---
    let bond_rules_present = !forcefield.bond_generator().rules().is_empty();
    for bond in topology.bonds() {
        let a = particle_index[&bond.atom1_id];
        let b = particle_index[&bond.atom2_id];
        let first = &particles[a];
        let second = &particles[b];
        if first.residue_id == second.residue_id && rigid_water.contains(&first.residue_id) {
            continue;
        }
        let constrained = match config.constraints {
            ConstraintLevel::AllBonds | ConstraintLevel::HydrogenAngles => true,
            ConstraintLevel::HydrogenBonds => {
                first.element == Some(Element::H) || second.element == Some(Element::H)
            }
            ConstraintLevel::None => false,
        };
        if !bond_rules_present && !constrained {
            // An absent rule set means this interaction kind is not in play.
            continue;
        }
        let rule = forcefield
            .bond_generator()
            .resolve(first.atom_type, second.atom_type)
            .ok_or_else(|| BuildError::UnresolvedBond {
                type1: first.atom_type.name.clone(),
                type2: second.atom_type.name.clone(),
            })?;
        if constrained {
            sink.add_constraint(Constraint {
                atom1: a,
                atom2: b,
                distance: rule.length,
            });
        } else {
            sink.add_bond_term(BondTerm {
                atom1: a,
                atom2: b,
                length: rule.length,
                k: rule.k,
            });
        }
    }

    // --- Angles: enumerated as unique bonded triples around each center ---
    let angle_rules_present = !forcefield.angle_generator().rules().is_empty();
    for (center, particle) in particles.iter().enumerate() {
        let neighbors: Vec<usize> = topology
            .bonded_neighbors(particle.atom_id)
            .unwrap()
            .iter()
            .map(|neighbor_id| particle_index[neighbor_id])
            .collect();
        for i in 0..neighbors.len() {
            for j in (i + 1)..neighbors.len() {
                let left = &particles[neighbors[i]];
                let right = &particles[neighbors[j]];
                if left.residue_id == particle.residue_id
                    && right.residue_id == particle.residue_id
                    && rigid_water.contains(&particle.residue_id)
                {
                    continue;
                }

                let left_hydrogen = left.element == Some(Element::H);
                let right_hydrogen = right.element == Some(Element::H);
                let constrained = config.constraints == ConstraintLevel::HydrogenAngles
                    && ((left_hydrogen && right_hydrogen)
                        || ((left_hydrogen || right_hydrogen)
                            && particle.element == Some(Element::O)));

                if constrained {
                    let bonds = forcefield.bond_generator();
                    let first = bonds.resolve(left.atom_type, particle.atom_type).ok_or_else(
                        || BuildError::UnresolvedBond {
                            type1: left.atom_type.name.clone(),
                            type2: particle.atom_type.name.clone(),
                        },
                    )?;
                    let second = bonds
                        .resolve(particle.atom_type, right.atom_type)
                        .ok_or_else(|| BuildError::UnresolvedBond {
                            type1: particle.atom_type.name.clone(),
                            type2: right.atom_type.name.clone(),
                        })?;
                    let angle = forcefield
                        .angle_generator()
                        .resolve(left.atom_type, particle.atom_type, right.atom_type)
                        .ok_or_else(|| BuildError::UnresolvedAngle {
                            type1: left.atom_type.name.clone(),
                            type2: particle.atom_type.name.clone(),
                            type3: right.atom_type.name.clone(),
                        })?;
                    sink.add_constraint(Constraint {
                        atom1: neighbors[i],
                        atom2: neighbors[j],
                        distance: triangle_third_side(first.length, second.length, angle.angle),
                    });
                    continue;
                }

                if !angle_rules_present {
                    continue;
                }
                let rule = forcefield
                    .angle_generator()
                    .resolve(left.atom_type, particle.atom_type, right.atom_type)
                    .ok_or_else(|| BuildError::UnresolvedAngle {
                        type1: left.atom_type.name.clone(),
                        type2: particle.atom_type.name.clone(),
                        type3: right.atom_type.name.clone(),
                    })?;
                sink.add_angle_term(AngleTerm {
                    atom1: neighbors[i],
                    atom2: center,
                    atom3: neighbors[j],
                    angle: rule.angle,
                    k: rule.k,
                });
            }
        }
    }

    // --- Proper torsions: one quad per neighbor pair around each bond ---
    let torsions = forcefield.torsion_generator();
    if !torsions.propers().is_empty() {
        for bond in topology.bonds() {
            let j = particle_index[&bond.atom1_id];
            let k = particle_index[&bond.atom2_id];
            for &outer_left in topology.bonded_neighbors(bond.atom1_id).unwrap() {
                let i = particle_index[&outer_left];
                if i == k {
                    continue;
                }
                for &outer_right in topology.bonded_neighbors(bond.atom2_id).unwrap() {
                    let l = particle_index[&outer_right];
                    if l == j || l == i {
                        continue;
                    }
                    let rule = torsions
                        .resolve_proper(
                            particles[i].atom_type,
                            particles[j].atom_type,
                            particles[k].atom_type,
                            particles[l].atom_type,
                        )
                        .ok_or_else(|| BuildError::UnresolvedTorsion {
                            type1: particles[i].atom_type.name.clone(),
                            type2: particles[j].atom_type.name.clone(),
                            type3: particles[k].atom_type.name.clone(),
                            type4: particles[l].atom_type.name.clone(),
                        })?;
                    sink.add_torsion_term(TorsionTerm {
                        atoms: [i, j, k, l],
                        periodicity: rule.periodicity,
                        phase: rule.phase,
                        k: rule.k,
                        kind: TorsionKind::Proper,
                    });
                }
            }
        }
    }

    // --- Impropers: optional, one term per neighbor triple that resolves ---
    if !torsions.impropers().is_empty() {
        for (center, particle) in particles.iter().enumerate() {
            let neighbors: Vec<usize> = topology
                .bonded_neighbors(particle.atom_id)
                .unwrap()
                .iter()
                .map(|neighbor_id| particle_index[neighbor_id])
                .collect();
            if neighbors.len() < 3 {
                continue;
            }
            for x in 0..neighbors.len() {
                for y in (x + 1)..neighbors.len() {
                    for z in (y + 1)..neighbors.len() {
                        let rule = torsions.resolve_improper(
                            particle.atom_type,
                            [
                                particles[neighbors[x]].atom_type,
                                particles[neighbors[y]].atom_type,
                                particles[neighbors[z]].atom_type,
                            ],
                        );
                        if let Some(rule) = rule {
                            sink.add_torsion_term(TorsionTerm {
                                atoms: [center, neighbors[x], neighbors[y], neighbors[z]],
                                periodicity: rule.periodicity,
                                phase: rule.phase,
                                k: rule.k,
                                kind: TorsionKind::Improper,
                            });
                        }
                    }
                }
            }
        }
    }

    // --- Pass-through settings ---
    if let Some(vectors) = topology.periodic_box_vectors() {
        sink.set_box_vectors(*vectors);
    }
    sink.set_remove_cm_motion(config.remove_cm_motion);
    sink.set_dielectrics(config.solvent_dielectric, config.solute_dielectric);

    info!(particles = particles.len(), "System assembly complete.");
    Ok(())
}

/// Sets every hydrogen to `hydrogen_mass`, drawing the difference from the
/// bonded heavy atom so total mass is preserved. A hydrogen with no heavy
/// partner keeps its type mass.
fn repartition_hydrogen_mass(
    topology: &Topology,
    particles: &[Particle],
    particle_index: &HashMap<AtomId, usize>,
    hydrogen_mass: f64,
    masses: &mut [f64],
) {
    for (index, particle) in particles.iter().enumerate() {
        if particle.element != Some(Element::H) {
            continue;
        }
        let heavy = topology
            .bonded_neighbors(particle.atom_id)
            .unwrap()
            .iter()
            .map(|neighbor_id| particle_index[neighbor_id])
            .find(|&neighbor| particles[neighbor].element != Some(Element::H));
        if let Some(heavy) = heavy {
            let transfer = hydrogen_mass - masses[index];
            masses[heavy] -= transfer;
            masses[index] = hydrogen_mass;
        }
    }
}

/// Identifies a water residue structurally: exactly one oxygen bonded to
/// exactly two hydrogens, nothing else.
fn water_atoms(topology: &Topology, residue_id: ResidueId) -> Option<(AtomId, AtomId, AtomId)> {
    let residue = topology.residue(residue_id)?;
    if residue.atoms().len() != 3 {
        return None;
    }
    let mut oxygen = None;
    let mut hydrogens = Vec::with_capacity(2);
    for &atom_id in residue.atoms() {
        match topology.atom(atom_id)?.element {
            Some(Element::O) => {
                if oxygen.replace(atom_id).is_some() {
                    return None;
                }
            }
            Some(Element::H) => hydrogens.push(atom_id),
            _ => return None,
        }
    }
    let oxygen = oxygen?;
    if hydrogens.len() != 2 {
        return None;
    }
    let neighbors = topology.bonded_neighbors(oxygen)?;
    if hydrogens.iter().all(|hydrogen| neighbors.contains(hydrogen)) {
        Some((oxygen, hydrogens[0], hydrogens[1]))
    } else {
        None
    }
}
