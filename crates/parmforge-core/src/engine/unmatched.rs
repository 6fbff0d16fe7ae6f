use super::matcher;
use super::signature::residue_signature;
use crate::core::forcefield::template::{ResidueTemplate, TemplateAtom};
use crate::core::models::ids::ResidueId;
use crate::core::models::topology::Topology;
use tracing::debug;

/// One distinct unmatched structure: its signature, a generated structural
/// template, an exemplar residue, and every residue sharing the structure.
pub struct UnmatchedGroup {
    pub signature: String,
    pub exemplar: ResidueId,
    pub members: Vec<ResidueId>,
    template: ResidueTemplate,
}

impl UnmatchedGroup {
    /// The generated structural template for this group's exemplar.
    pub fn template(&self) -> &ResidueTemplate {
        &self.template
    }
}

/// Deduplicates unmatched residues by structure.
///
/// Residues are grouped by structural signature and then verified by true
/// isomorphism within each signature group, so a template-generator hook is
/// invoked once per distinct structure rather than once per residue
/// instance. Groups come out in first-seen order.
pub fn deduplicate(topology: &Topology, residues: &[ResidueId]) -> Vec<UnmatchedGroup> {
    let mut groups: Vec<UnmatchedGroup> = Vec::new();

    for &residue_id in residues {
        let signature = residue_signature(topology, residue_id);
        let existing = groups.iter().position(|group| {
            group.signature == signature
                && matcher::matches_template(topology, residue_id, &group.template).is_some()
        });
        match existing {
            Some(index) => groups[index].members.push(residue_id),
            None => {
                let template = generate_template(topology, residue_id);
                groups.push(UnmatchedGroup {
                    signature,
                    exemplar: residue_id,
                    members: vec![residue_id],
                    template,
                });
            }
        }
    }

    debug!(
        residues = residues.len(),
        structures = groups.len(),
        "Deduplicated unmatched residues."
    );
    groups
}

/// Synthesizes a minimal template from a residue's structure.
///
/// The template keeps the residue's name; each atom gets a uniquely named
/// placeholder type (`<residue>-<atom>-<index>`) carrying the atom's element
/// but no interaction parameters. Bonds and external-bond counts are copied
/// from the topology. Callers are expected to replace or register the
/// placeholder types before registering the template.
pub fn generate_template(topology: &Topology, residue_id: ResidueId) -> ResidueTemplate {
    let residue = topology
        .residue(residue_id)
        .expect("residue must exist in topology");
    let mut template = ResidueTemplate::new(&residue.name);

    for (index, &atom_id) in residue.atoms().iter().enumerate() {
        let atom = topology.atom(atom_id).expect("atom must exist in topology");
        let type_name = format!("{}-{}-{}", residue.name, atom.name, index);
        template.add_atom(TemplateAtom::new(&atom.name, &type_name, atom.element));
        for _ in 0..topology.external_degree(atom_id) {
            template
                .add_external_bond(index)
                .expect("index is in range by construction");
        }
    }

    let local_index = |atom_id| residue.atoms().iter().position(|&id| id == atom_id);
    for bond in topology.bonds() {
        if let (Some(a), Some(b)) = (local_index(bond.atom1_id), local_index(bond.atom2_id)) {
            template
                .add_bond(a, b)
                .expect("indices are in range by construction");
        }
    }

    template
}
