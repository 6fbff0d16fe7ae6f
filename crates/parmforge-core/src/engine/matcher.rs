use crate::core::forcefield::template::ResidueTemplate;
use crate::core::models::element::Element;
use crate::core::models::ids::ResidueId;
use crate::core::models::topology::Topology;
use std::collections::HashMap;
use tracing::trace;

/// Outcome of matching one residue against the template library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Exactly one template admits a valid isomorphism. `mapping[i]` is the
    /// template atom index assigned to the residue's i-th atom.
    Matched { template: usize, mapping: Vec<usize> },
    /// No template admits a valid isomorphism. Non-fatal at this layer.
    NoMatch,
    /// Two or more distinct templates admit valid isomorphisms. Must be
    /// reported, never silently resolved.
    Ambiguous { candidates: Vec<String> },
}

/// Local view of one residue's bond graph, precomputed for matching.
///
/// Indices are residue-local (position within `Residue::atoms`). External
/// bonds are folded into a per-atom count so a template's external-bond
/// markers can be checked without touching neighboring residues.
pub(crate) struct ResidueProfile {
    elements: Vec<Option<Element>>,
    intra_degree: Vec<usize>,
    external_degree: Vec<usize>,
    adjacency: Vec<Vec<usize>>,
    bond_count: usize,
}

impl ResidueProfile {
    pub(crate) fn new(topology: &Topology, residue_id: ResidueId) -> Self {
        let residue = topology
            .residue(residue_id)
            .expect("residue must exist in topology");
        let atoms = residue.atoms();
        let local_index: HashMap<_, _> = atoms
            .iter()
            .enumerate()
            .map(|(index, &atom_id)| (atom_id, index))
            .collect();

        let mut elements = Vec::with_capacity(atoms.len());
        let mut intra_degree = Vec::with_capacity(atoms.len());
        let mut external_degree = Vec::with_capacity(atoms.len());
        let mut adjacency = vec![Vec::new(); atoms.len()];
        let mut bond_count = 0;

        for (index, &atom_id) in atoms.iter().enumerate() {
            let atom = topology.atom(atom_id).expect("atom must exist in topology");
            elements.push(atom.element);
            let mut intra = 0;
            let mut external = 0;
            for &neighbor_id in topology.bonded_neighbors(atom_id).unwrap_or(&[]) {
                match local_index.get(&neighbor_id) {
                    Some(&neighbor_index) => {
                        intra += 1;
                        adjacency[index].push(neighbor_index);
                        if index < neighbor_index {
                            bond_count += 1;
                        }
                    }
                    None => external += 1,
                }
            }
            intra_degree.push(intra);
            external_degree.push(external);
        }

        Self {
            elements,
            intra_degree,
            external_degree,
            adjacency,
            bond_count,
        }
    }

    pub(crate) fn atom_count(&self) -> usize {
        self.elements.len()
    }

    /// Attempts a structural isomorphism onto the template.
    ///
    /// Returns the first valid mapping found by backtracking over residue
    /// atoms in order, trying template atoms in ascending index order — a
    /// deterministic visitation, so repeated calls return the same mapping.
    /// Any single valid mapping suffices; symmetric substructures (e.g. the
    /// two hydrogens of water) are not canonicalized further.
    pub(crate) fn match_template(&self, template: &ResidueTemplate) -> Option<Vec<usize>> {
        if template.atom_count() != self.atom_count() || template.bonds().len() != self.bond_count {
            return None;
        }

        let n = self.atom_count();
        let mut mapping = vec![usize::MAX; n];
        let mut used = vec![false; n];
        if self.search(template, 0, &mut mapping, &mut used) {
            Some(mapping)
        } else {
            None
        }
    }

    fn search(
        &self,
        template: &ResidueTemplate,
        depth: usize,
        mapping: &mut Vec<usize>,
        used: &mut Vec<bool>,
    ) -> bool {
        if depth == self.atom_count() {
            return true;
        }
        for candidate in 0..template.atom_count() {
            if used[candidate] || !self.is_compatible(template, depth, candidate) {
                continue;
            }
            if !self.is_consistent(template, depth, candidate, mapping) {
                continue;
            }
            mapping[depth] = candidate;
            used[candidate] = true;
            if self.search(template, depth + 1, mapping, used) {
                return true;
            }
            mapping[depth] = usize::MAX;
            used[candidate] = false;
        }
        false
    }

    /// Element and degree pruning for a single atom pair.
    fn is_compatible(&self, template: &ResidueTemplate, atom: usize, candidate: usize) -> bool {
        let template_atom = &template.atoms()[candidate];
        let element_ok = match template_atom.element {
            // A template atom with unconstrained element matches anything.
            None => true,
            Some(element) => self.elements[atom] == Some(element),
        };
        element_ok
            && template.intra_degree(candidate) == self.intra_degree[atom]
            && template_atom.external_bonds == self.external_degree[atom]
    }

    /// Bond consistency against all previously assigned atoms.
    fn is_consistent(
        &self,
        template: &ResidueTemplate,
        atom: usize,
        candidate: usize,
        mapping: &[usize],
    ) -> bool {
        for earlier in 0..atom {
            let bonded_in_residue = self.adjacency[atom].contains(&earlier);
            let bonded_in_template = template.has_bond(candidate, mapping[earlier]);
            if bonded_in_residue != bonded_in_template {
                return false;
            }
        }
        true
    }
}

/// Matches one residue against a template library.
///
/// Templates are scanned in registration order; if more than one distinct
/// template admits a valid mapping the result is [`MatchResult::Ambiguous`].
/// Takes the template slice rather than the whole force field so the
/// read-only matching phase can run on worker threads without touching the
/// (single-threaded) hook registry.
pub fn match_residue(
    topology: &Topology,
    residue_id: ResidueId,
    templates: &[ResidueTemplate],
) -> MatchResult {
    let profile = ResidueProfile::new(topology, residue_id);
    let mut found: Option<(usize, Vec<usize>)> = None;
    let mut candidates: Vec<String> = Vec::new();

    for (index, template) in templates.iter().enumerate() {
        if let Some(mapping) = profile.match_template(template) {
            trace!(template = %template.name, "Template admits a valid mapping.");
            candidates.push(template.name.clone());
            if found.is_none() {
                found = Some((index, mapping));
            }
        }
    }

    match (found, candidates.len()) {
        (Some((template, mapping)), 1) => MatchResult::Matched { template, mapping },
        (Some(_), _) => MatchResult::Ambiguous { candidates },
        (None, _) => MatchResult::NoMatch,
    }
}

/// Checks a single residue against a single template, outside any registry.
pub(crate) fn matches_template(
    topology: &Topology,
    residue_id: ResidueId,
    template: &ResidueTemplate,
) -> Option<Vec<usize>> {
    ResidueProfile::new(topology, residue_id).match_template(template)
}
