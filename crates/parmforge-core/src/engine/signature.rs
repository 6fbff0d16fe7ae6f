use crate::core::models::ids::ResidueId;
use crate::core::models::topology::Topology;

/// Computes a structural signature for one residue.
///
/// The signature folds the element sequence, the intra/external degree of
/// every atom, and the bond multiset into a canonical string. Residues with
/// different signatures are guaranteed structurally distinct; residues with
/// equal signatures are *candidates* for identity and still need an
/// isomorphism check (the signature is a cheap pre-filter, not a proof).
pub fn residue_signature(topology: &Topology, residue_id: ResidueId) -> String {
    let residue = topology
        .residue(residue_id)
        .expect("residue must exist in topology");

    let mut atom_descriptors: Vec<String> = residue
        .atoms()
        .iter()
        .map(|&atom_id| {
            let atom = topology.atom(atom_id).expect("atom must exist in topology");
            let symbol = atom.element.map(|e| e.symbol()).unwrap_or("?");
            format!(
                "{}/{}/{}",
                symbol,
                topology.intra_degree(atom_id),
                topology.external_degree(atom_id)
            )
        })
        .collect();
    atom_descriptors.sort_unstable();

    let mut bond_descriptors: Vec<String> = topology
        .bonds()
        .iter()
        .filter(|bond| {
            let a = topology.atom(bond.atom1_id).expect("bond endpoint must exist");
            let b = topology.atom(bond.atom2_id).expect("bond endpoint must exist");
            a.residue_id == residue_id && b.residue_id == residue_id
        })
        .map(|bond| {
            let mut pair = [
                topology.atom(bond.atom1_id).unwrap().element,
                topology.atom(bond.atom2_id).unwrap().element,
            ]
            .map(|element| element.map(|e| e.symbol()).unwrap_or("?"));
            pair.sort_unstable();
            format!("{}-{}", pair[0], pair[1])
        })
        .collect();
    bond_descriptors.sort_unstable();

    format!(
        "{}#{}",
        atom_descriptors.join("|"),
        bond_descriptors.join("|")
    )
}
