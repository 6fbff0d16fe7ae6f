use crate::core::models::ids::ResidueId;
use crate::core::models::topology::Topology;
use thiserror::Error;

/// Errors raised while building a system from a topology.
///
/// Every variant aborts the entire build; there is no partial-success mode.
/// Structural mismatches are accumulated first so a single failure reports
/// every unmatched residue at once instead of stopping at the first.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("No template found for {} residue(s): {}", residues.len(), residues.join(", "))]
    UnmatchedResidues { residues: Vec<String> },

    #[error("Multiple templates match residue {residue}: {}", candidates.join(", "))]
    AmbiguousTemplate {
        residue: String,
        candidates: Vec<String>,
    },

    #[error("No nonbonded rule set is registered")]
    MissingNonbondedGenerator,

    #[error("No nonbonded parameters for atom type '{type_name}'")]
    UnresolvedNonbonded { type_name: String },

    #[error("No charge available for atom '{atom}' of residue {residue}")]
    MissingCharge { residue: String, atom: String },

    #[error("No bond parameters for types '{type1}'-'{type2}'")]
    UnresolvedBond { type1: String, type2: String },

    #[error("No angle parameters for types '{type1}'-'{type2}'-'{type3}'")]
    UnresolvedAngle {
        type1: String,
        type2: String,
        type3: String,
    },

    #[error("No torsion parameters for types '{type1}'-'{type2}'-'{type3}'-'{type4}'")]
    UnresolvedTorsion {
        type1: String,
        type2: String,
        type3: String,
        type4: String,
    },

    #[error(
        "Cannot build rigid water for residue {residue}: missing O-H bond or H-O-H angle parameters"
    )]
    MissingWaterParameters { residue: String },
}

/// Formats a residue as "NAME chain:number" for diagnostics.
pub(crate) fn describe_residue(topology: &Topology, residue_id: ResidueId) -> String {
    match topology.residue(residue_id) {
        Some(residue) => {
            let chain_id = topology
                .chain(residue.chain_id)
                .map(|chain| chain.id)
                .unwrap_or('?');
            format!("{} {}:{}", residue.name, chain_id, residue.id)
        }
        None => "<unknown residue>".to_string(),
    }
}
