use super::config::NonbondedMethod;
use nalgebra::Vector3;

/// Nonbonded settings forwarded verbatim to the consuming engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedSettings {
    pub method: NonbondedMethod,
    /// Cutoff distance in nanometers.
    pub cutoff: f64,
    pub dispersion_correction: bool,
    pub coulomb14_scale: f64,
    pub lj14_scale: f64,
}

/// Per-particle nonbonded parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedParticle {
    pub charge: f64,
    pub sigma: f64,
    pub epsilon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondTerm {
    pub atom1: usize,
    pub atom2: usize,
    pub length: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleTerm {
    pub atom1: usize,
    pub atom2: usize,
    pub atom3: usize,
    pub angle: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorsionKind {
    Proper,
    /// The central atom is the first of the four.
    Improper,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsionTerm {
    pub atoms: [usize; 4],
    pub periodicity: u32,
    pub phase: f64,
    pub k: f64,
    pub kind: TorsionKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub atom1: usize,
    pub atom2: usize,
    pub distance: f64,
}

/// The seam to the external simulation engine.
///
/// The build workflow pushes resolved parameters through this trait and
/// never reads them back; implementations are free to translate calls into
/// whatever representation their engine wants. Particle indices follow
/// topology order and are dense from zero.
pub trait SystemSink {
    fn add_particle(&mut self, mass: f64);
    fn add_nonbonded_particle(&mut self, particle: NonbondedParticle);
    fn set_nonbonded_settings(&mut self, settings: NonbondedSettings);
    fn add_bond_term(&mut self, term: BondTerm);
    fn add_angle_term(&mut self, term: AngleTerm);
    fn add_torsion_term(&mut self, term: TorsionTerm);
    fn add_constraint(&mut self, constraint: Constraint);
    fn set_box_vectors(&mut self, vectors: [Vector3<f64>; 3]);
    fn set_remove_cm_motion(&mut self, remove: bool);
    fn set_dielectrics(&mut self, solvent: f64, solute: f64);
}

/// A recording implementation of [`SystemSink`]: the default build target.
///
/// Holds the complete parameter tables so callers (and tests) can inspect
/// exactly what would be handed to a simulation engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct System {
    masses: Vec<f64>,
    nonbonded_settings: Option<NonbondedSettings>,
    nonbonded_particles: Vec<NonbondedParticle>,
    bonds: Vec<BondTerm>,
    angles: Vec<AngleTerm>,
    torsions: Vec<TorsionTerm>,
    constraints: Vec<Constraint>,
    box_vectors: Option<[Vector3<f64>; 3]>,
    remove_cm_motion: bool,
    dielectrics: Option<(f64, f64)>,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particle_count(&self) -> usize {
        self.masses.len()
    }

    pub fn particle_mass(&self, index: usize) -> Option<f64> {
        self.masses.get(index).copied()
    }

    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    pub fn nonbonded_settings(&self) -> Option<&NonbondedSettings> {
        self.nonbonded_settings.as_ref()
    }

    pub fn nonbonded_particles(&self) -> &[NonbondedParticle] {
        &self.nonbonded_particles
    }

    pub fn bonds(&self) -> &[BondTerm] {
        &self.bonds
    }

    pub fn angles(&self) -> &[AngleTerm] {
        &self.angles
    }

    pub fn torsions(&self) -> &[TorsionTerm] {
        &self.torsions
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn box_vectors(&self) -> Option<&[Vector3<f64>; 3]> {
        self.box_vectors.as_ref()
    }

    pub fn remove_cm_motion(&self) -> bool {
        self.remove_cm_motion
    }

    pub fn dielectrics(&self) -> Option<(f64, f64)> {
        self.dielectrics
    }
}

impl SystemSink for System {
    fn add_particle(&mut self, mass: f64) {
        self.masses.push(mass);
    }

    fn add_nonbonded_particle(&mut self, particle: NonbondedParticle) {
        self.nonbonded_particles.push(particle);
    }

    fn set_nonbonded_settings(&mut self, settings: NonbondedSettings) {
        self.nonbonded_settings = Some(settings);
    }

    fn add_bond_term(&mut self, term: BondTerm) {
        self.bonds.push(term);
    }

    fn add_angle_term(&mut self, term: AngleTerm) {
        self.angles.push(term);
    }

    fn add_torsion_term(&mut self, term: TorsionTerm) {
        self.torsions.push(term);
    }

    fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    fn set_box_vectors(&mut self, vectors: [Vector3<f64>; 3]) {
        self.box_vectors = Some(vectors);
    }

    fn set_remove_cm_motion(&mut self, remove: bool) {
        self.remove_cm_motion = remove;
    }

    fn set_dielectrics(&mut self, solvent: f64, solute: f64) {
        self.dielectrics = Some((solvent, solute));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_accumulates_everything_in_order() {
        let mut system = System::new();
        system.add_particle(15.999);
        system.add_particle(1.008);
        system.add_bond_term(BondTerm {
            atom1: 0,
            atom2: 1,
            length: 0.09572,
            k: 462750.4,
        });
        system.add_constraint(Constraint {
            atom1: 0,
            atom2: 1,
            distance: 0.09572,
        });
        system.set_remove_cm_motion(true);
        system.set_dielectrics(50.0, 0.9);

        assert_eq!(system.particle_count(), 2);
        assert_eq!(system.particle_mass(0), Some(15.999));
        assert_eq!(system.particle_mass(2), None);
        assert!((system.total_mass() - 17.007).abs() < 1e-12);
        assert_eq!(system.bonds().len(), 1);
        assert_eq!(system.constraints().len(), 1);
        assert!(system.remove_cm_motion());
        assert_eq!(system.dielectrics(), Some((50.0, 0.9)));
        assert!(system.nonbonded_settings().is_none());
    }
}
