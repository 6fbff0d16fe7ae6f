use super::ids::{AtomId, ChainId};

/// A residue: an ordered sequence of atoms within a chain.
///
/// Residue identity is structural, not name-based: template matching compares
/// the residue's bond graph against registered templates, so `name` is carried
/// for diagnostics and template generation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub id: isize,    // Residue sequence number from the source structure
    pub name: String, // Name of the residue (e.g., "ALA", "HOH")
    pub chain_id: ChainId,
    pub(crate) atoms: Vec<AtomId>,
}

impl Residue {
    pub(crate) fn new(id: isize, name: &str, chain_id: ChainId) -> Self {
        Self {
            id,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_id: AtomId) {
        self.atoms.push(atom_id);
    }

    /// Returns the residue's atoms in insertion order.
    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }
}
