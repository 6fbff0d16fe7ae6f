use super::element::Element;
use super::ids::ResidueId;

/// Represents an atom in a molecular topology.
///
/// The topology layer is purely structural: an atom carries its identity and
/// element but no force-field parameters. Atom types, charges, and masses are
/// assigned during parameterization from the matched residue template, so the
/// topology stays read-only while a build is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The chemical element, or `None` when the element is unknown.
    pub element: Option<Element>,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
}

impl Atom {
    /// Creates a new `Atom` with the provided name, element, and parent residue.
    pub fn new(name: &str, element: Option<Element>, residue_id: ResidueId) -> Self {
        Self {
            name: name.to_string(),
            element,
            residue_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_residue_id(n: u64) -> ResidueId {
        ResidueId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_atom_initializes_fields_correctly() {
        let residue_id = dummy_residue_id(1);
        let atom = Atom::new("CA", Some(Element::C), residue_id);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.element, Some(Element::C));
        assert_eq!(atom.residue_id, residue_id);
    }

    #[test]
    fn atom_element_may_be_unknown() {
        let atom = Atom::new("X1", None, dummy_residue_id(2));
        assert!(atom.element.is_none());
    }

    #[test]
    fn atom_equality_and_clone_works() {
        let atom1 = Atom::new("N", Some(Element::N), dummy_residue_id(3));
        let atom2 = atom1.clone();
        assert_eq!(atom1, atom2);
    }
}
