use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use nalgebra::Vector3;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

/// An unordered bond between two atoms.
///
/// Whether a bond is intra-residue or external (crossing a residue boundary)
/// is derived from its endpoints rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
}

impl Bond {
    pub fn new(atom1_id: AtomId, atom2_id: AtomId) -> Self {
        Self { atom1_id, atom2_id }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }

    /// Returns the endpoint opposite to `atom_id`, if `atom_id` is an endpoint.
    pub fn other(&self, atom_id: AtomId) -> Option<AtomId> {
        if self.atom1_id == atom_id {
            Some(self.atom2_id)
        } else if self.atom2_id == atom_id {
            Some(self.atom1_id)
        } else {
            None
        }
    }
}

/// Represents a complete molecular topology: chains, residues, atoms, and bonds.
///
/// This struct serves as the central data structure for parameterization,
/// providing efficient storage and access to all molecular components. It
/// maintains an adjacency cache so degree and neighbor queries are cheap
/// during template matching.
///
/// Invariants: every atom belongs to exactly one residue, and every bond
/// references two atoms that both exist in the topology. Iteration orders
/// (chains, residues within a chain, atoms within a residue) follow insertion
/// order, which defines the "topology order" used by all queries.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
    /// Chains in insertion order.
    chain_order: Vec<ChainId>,
    /// All bonds in the topology.
    bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by atom ID.
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
    /// Periodic box vectors, if the topology is periodic.
    box_vectors: Option<[Vector3<f64>; 3]>,
}

impl Topology {
    /// Creates a new, empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves an immutable reference to a residue by its ID.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Retrieves an immutable reference to a chain by its ID.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns the number of atoms in the topology.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Returns the number of residues in the topology.
    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    /// Returns a slice of all bonds in the topology.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Returns chain IDs in insertion order.
    pub fn chains_in_order(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chain_order.iter().copied()
    }

    /// Returns residue IDs in topology order (chains in insertion order,
    /// residues within a chain in insertion order).
    pub fn residues_in_order(&self) -> impl Iterator<Item = ResidueId> + '_ {
        self.chain_order
            .iter()
            .flat_map(|&chain_id| self.chains[chain_id].residues().iter().copied())
    }

    /// Returns atom IDs in topology order (following `residues_in_order`,
    /// atoms within a residue in insertion order).
    pub fn atoms_in_order(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.residues_in_order()
            .flat_map(|residue_id| self.residues[residue_id].atoms().iter().copied())
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Adds a new chain to the topology or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given ID already exists,
    /// it returns the existing chain ID without creating a duplicate.
    pub fn add_chain(&mut self, id: char) -> ChainId {
        if let Some(&chain_id) = self.chain_id_map.get(&id) {
            return chain_id;
        }
        let chain_id = self.chains.insert(Chain::new(id));
        self.chain_id_map.insert(id, chain_id);
        self.chain_order.push(chain_id);
        chain_id
    }

    /// Adds a new residue to the given chain.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - The ID of the chain to add the residue to.
    /// * `number` - The sequential number of the residue.
    /// * `name` - The name of the residue.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if successful, otherwise `None` (e.g., if the
    /// chain doesn't exist).
    pub fn add_residue(&mut self, chain_id: ChainId, number: isize, name: &str) -> Option<ResidueId> {
        if !self.chains.contains_key(chain_id) {
            return None;
        }
        let residue_id = self.residues.insert(Residue::new(number, name, chain_id));
        self.chains[chain_id].residues.push(residue_id);
        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// The atom's `residue_id` is overwritten with `residue_id` so the
    /// back-reference invariant always holds.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (e.g., if the
    /// residue doesn't exist).
    pub fn add_atom(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        atom.residue_id = residue_id;
        let atom_id = self.atoms.insert(atom);
        self.bond_adjacency.insert(atom_id, Vec::new());
        self.residues[residue_id].add_atom(atom_id);
        Some(atom_id)
    }

    /// Adds a bond between two atoms.
    ///
    /// This method is idempotent; adding an existing bond succeeds without
    /// creating duplicates.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if successful, otherwise `None` (e.g., if either
    /// atom doesn't exist).
    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId) -> Option<()> {
        if !self.atoms.contains_key(atom1_id) || !self.atoms.contains_key(atom2_id) {
            return None;
        }

        if let Some(neighbors) = self.bond_adjacency.get(atom1_id) {
            if neighbors.contains(&atom2_id) {
                // Bond already exists, operation is successful (idempotent)
                return Some(());
            }
        }

        self.bonds.push(Bond::new(atom1_id, atom2_id));
        self.bond_adjacency[atom1_id].push(atom2_id);
        self.bond_adjacency[atom2_id].push(atom1_id);
        Some(())
    }

    /// Retrieves the bonded neighbors of an atom.
    ///
    /// # Return
    ///
    /// Returns `Some(&[AtomId])` if the atom exists, otherwise `None`.
    pub fn bonded_neighbors(&self, atom_id: AtomId) -> Option<&[AtomId]> {
        self.bond_adjacency.get(atom_id).map(|v| v.as_slice())
    }

    /// Counts the bonds from `atom_id` to atoms within the same residue.
    pub fn intra_degree(&self, atom_id: AtomId) -> usize {
        let residue_id = self.atoms[atom_id].residue_id;
        self.bond_adjacency[atom_id]
            .iter()
            .filter(|&&n| self.atoms[n].residue_id == residue_id)
            .count()
    }

    /// Counts the bonds from `atom_id` that cross its residue boundary.
    pub fn external_degree(&self, atom_id: AtomId) -> usize {
        let residue_id = self.atoms[atom_id].residue_id;
        self.bond_adjacency[atom_id]
            .iter()
            .filter(|&&n| self.atoms[n].residue_id != residue_id)
            .count()
    }

    /// Sets the periodic box vectors.
    pub fn set_periodic_box_vectors(&mut self, vectors: [Vector3<f64>; 3]) {
        self.box_vectors = Some(vectors);
    }

    /// Returns the periodic box vectors, if any were set.
    pub fn periodic_box_vectors(&self) -> Option<&[Vector3<f64>; 3]> {
        self.box_vectors.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;

    struct TestRefs {
        chain_a_id: ChainId,
        gly_id: ResidueId,
        gly_n_id: AtomId,
        gly_ca_id: AtomId,
        ala_id: ResidueId,
        ala_ca_id: AtomId,
    }

    fn create_standard_test_topology() -> (Topology, TestRefs) {
        let mut topology = Topology::new();

        let chain_a_id = topology.add_chain('A');

        let gly_id = topology.add_residue(chain_a_id, 1, "GLY").unwrap();
        let gly_n_id = topology
            .add_atom(gly_id, Atom::new("N", Some(Element::N), gly_id))
            .unwrap();
        let gly_ca_id = topology
            .add_atom(gly_id, Atom::new("CA", Some(Element::C), gly_id))
            .unwrap();
        topology.add_bond(gly_n_id, gly_ca_id).unwrap();

        let ala_id = topology.add_residue(chain_a_id, 2, "ALA").unwrap();
        let ala_ca_id = topology
            .add_atom(ala_id, Atom::new("CA", Some(Element::C), ala_id))
            .unwrap();
        topology.add_bond(gly_ca_id, ala_ca_id).unwrap();

        let refs = TestRefs {
            chain_a_id,
            gly_id,
            gly_n_id,
            gly_ca_id,
            ala_id,
            ala_ca_id,
        };

        (topology, refs)
    }

    #[test]
    fn topology_creation_and_access() {
        let (topology, refs) = create_standard_test_topology();

        assert_eq!(topology.atom_count(), 3);
        assert_eq!(topology.residue_count(), 2);
        assert_eq!(topology.chains_in_order().count(), 1);
        assert_eq!(topology.bonds().len(), 2);
        assert!(topology.find_chain_by_id('B').is_none());
        assert_eq!(topology.find_chain_by_id('A'), Some(refs.chain_a_id));

        assert_eq!(topology.residue(refs.gly_id).unwrap().name, "GLY");
        assert_eq!(topology.atom(refs.gly_n_id).unwrap().name, "N");
        assert_eq!(topology.atom(refs.gly_n_id).unwrap().residue_id, refs.gly_id);
    }

    #[test]
    fn add_chain_is_idempotent() {
        let mut topology = Topology::new();
        let first = topology.add_chain('A');
        let second = topology.add_chain('A');
        assert_eq!(first, second);
        assert_eq!(topology.chains_in_order().count(), 1);
    }

    #[test]
    fn add_residue_fails_for_missing_chain() {
        let mut topology = Topology::new();
        topology.add_chain('A');
        assert!(topology.add_residue(ChainId::default(), 1, "GLY").is_none());
    }

    #[test]
    fn idempotent_add_bond_does_not_create_duplicates() {
        let (mut topology, refs) = create_standard_test_topology();
        topology.add_bond(refs.gly_n_id, refs.gly_ca_id).unwrap();
        topology.add_bond(refs.gly_ca_id, refs.gly_n_id).unwrap();

        assert_eq!(topology.bonds().len(), 2);
        let neighbors = topology.bonded_neighbors(refs.gly_n_id).unwrap();
        assert_eq!(neighbors.len(), 1);
    }

    #[test]
    fn bonded_neighbors_returns_correct_neighbors() {
        let (topology, refs) = create_standard_test_topology();

        let n_neighbors = topology.bonded_neighbors(refs.gly_n_id).unwrap();
        assert_eq!(n_neighbors, &[refs.gly_ca_id]);

        let ca_neighbors = topology.bonded_neighbors(refs.gly_ca_id).unwrap();
        assert_eq!(ca_neighbors.len(), 2);
        assert!(ca_neighbors.contains(&refs.gly_n_id));
        assert!(ca_neighbors.contains(&refs.ala_ca_id));
    }

    #[test]
    fn intra_and_external_degree_split_at_residue_boundary() {
        let (topology, refs) = create_standard_test_topology();

        // GLY CA is bonded to GLY N (intra) and ALA CA (external).
        assert_eq!(topology.intra_degree(refs.gly_ca_id), 1);
        assert_eq!(topology.external_degree(refs.gly_ca_id), 1);

        assert_eq!(topology.intra_degree(refs.gly_n_id), 1);
        assert_eq!(topology.external_degree(refs.gly_n_id), 0);

        assert_eq!(topology.intra_degree(refs.ala_ca_id), 0);
        assert_eq!(topology.external_degree(refs.ala_ca_id), 1);
    }

    #[test]
    fn iteration_follows_topology_order() {
        let (topology, refs) = create_standard_test_topology();

        let residues: Vec<_> = topology.residues_in_order().collect();
        assert_eq!(residues, vec![refs.gly_id, refs.ala_id]);

        let atoms: Vec<_> = topology.atoms_in_order().collect();
        assert_eq!(atoms, vec![refs.gly_n_id, refs.gly_ca_id, refs.ala_ca_id]);
    }

    #[test]
    fn bond_other_returns_opposite_endpoint() {
        let (topology, refs) = create_standard_test_topology();
        let bond = topology.bonds()[0];
        assert_eq!(bond.other(refs.gly_n_id), Some(refs.gly_ca_id));
        assert_eq!(bond.other(refs.gly_ca_id), Some(refs.gly_n_id));
        assert_eq!(bond.other(refs.ala_ca_id), None);
        assert!(bond.contains(refs.gly_n_id));
    }

    #[test]
    fn periodic_box_vectors_round_trip() {
        let (mut topology, _) = create_standard_test_topology();
        assert!(topology.periodic_box_vectors().is_none());

        let vectors = [
            Vector3::new(5.0, 0.0, 0.0),
            Vector3::new(-1.5, 4.5, 0.0),
            Vector3::new(0.4, 0.8, 7.5),
        ];
        topology.set_periodic_box_vectors(vectors);
        assert_eq!(topology.periodic_box_vectors(), Some(&vectors));
    }
}
