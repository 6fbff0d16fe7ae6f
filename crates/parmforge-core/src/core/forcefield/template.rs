use super::error::ForceFieldError;
use crate::core::models::element::Element;

/// One atom of a residue template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAtom {
    /// Atom name within the template (e.g., "O", "H1").
    pub name: String,
    /// Name of the atom type this template atom is bound to.
    pub type_name: String,
    /// The element, used for matching; `None` matches any element.
    pub element: Option<Element>,
    /// Per-atom charge, for force fields that carry charges on residue
    /// atoms instead of nonbonded rules.
    pub charge: Option<f64>,
    /// Number of bonds this atom forms to atoms outside the residue.
    pub external_bonds: usize,
}

impl TemplateAtom {
    pub fn new(name: &str, type_name: &str, element: Option<Element>) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            element,
            charge: None,
            external_bonds: 0,
        }
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = Some(charge);
        self
    }
}

/// A residue template: the structural pattern a topology residue is matched
/// against, plus the atom types assigned on a successful match.
///
/// Matching is structural, not name-based: the template's bond graph
/// (including external-bond markers) must be isomorphic to the residue's
/// bond graph under element compatibility. The template name exists for
/// registration and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueTemplate {
    pub name: String,
    atoms: Vec<TemplateAtom>,
    bonds: Vec<(usize, usize)>,
}

impl ResidueTemplate {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            atoms: Vec::new(),
            bonds: Vec::new(),
        }
    }

    /// Appends a template atom and returns its index.
    pub fn add_atom(&mut self, atom: TemplateAtom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Adds an intra-template bond between two atom indices.
    ///
    /// # Errors
    ///
    /// Returns [`ForceFieldError::InvalidTemplate`] if either index is out of
    /// range or the bond is a self-loop.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize) -> Result<(), ForceFieldError> {
        if atom1 == atom2 || atom1 >= self.atoms.len() || atom2 >= self.atoms.len() {
            return Err(ForceFieldError::InvalidTemplate {
                template: self.name.clone(),
                reason: format!("bond ({atom1}, {atom2}) does not reference two distinct atoms"),
            });
        }
        let key = (atom1.min(atom2), atom1.max(atom2));
        if !self.bonds.contains(&key) {
            self.bonds.push(key);
        }
        Ok(())
    }

    /// Marks one more external bond on the atom at `atom_index`.
    ///
    /// # Errors
    ///
    /// Returns [`ForceFieldError::InvalidTemplate`] if the index is out of range.
    pub fn add_external_bond(&mut self, atom_index: usize) -> Result<(), ForceFieldError> {
        match self.atoms.get_mut(atom_index) {
            Some(atom) => {
                atom.external_bonds += 1;
                Ok(())
            }
            None => Err(ForceFieldError::InvalidTemplate {
                template: self.name.clone(),
                reason: format!("external bond references atom index {atom_index} out of range"),
            }),
        }
    }

    pub fn atoms(&self) -> &[TemplateAtom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [TemplateAtom] {
        &mut self.atoms
    }

    pub fn bonds(&self) -> &[(usize, usize)] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Counts the intra-template bonds of the atom at `index`.
    pub fn intra_degree(&self, index: usize) -> usize {
        self.bonds
            .iter()
            .filter(|(a, b)| *a == index || *b == index)
            .count()
    }

    /// Checks whether the template has a bond between the two atom indices.
    pub fn has_bond(&self, atom1: usize, atom2: usize) -> bool {
        let key = (atom1.min(atom2), atom1.max(atom2));
        self.bonds.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_template() -> ResidueTemplate {
        let mut template = ResidueTemplate::new("HOH");
        template.add_atom(TemplateAtom::new("O", "tip3p-O", Some(Element::O)));
        template.add_atom(TemplateAtom::new("H1", "tip3p-H", Some(Element::H)));
        template.add_atom(TemplateAtom::new("H2", "tip3p-H", Some(Element::H)));
        template.add_bond(0, 1).unwrap();
        template.add_bond(0, 2).unwrap();
        template
    }

    #[test]
    fn template_construction_tracks_atoms_and_bonds() {
        let template = water_template();
        assert_eq!(template.name, "HOH");
        assert_eq!(template.atom_count(), 3);
        assert_eq!(template.bonds(), &[(0, 1), (0, 2)]);
        assert_eq!(template.intra_degree(0), 2);
        assert_eq!(template.intra_degree(1), 1);
        assert!(template.has_bond(1, 0));
        assert!(!template.has_bond(1, 2));
    }

    #[test]
    fn add_bond_rejects_out_of_range_and_self_loops() {
        let mut template = water_template();
        assert!(matches!(
            template.add_bond(0, 3),
            Err(ForceFieldError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            template.add_bond(1, 1),
            Err(ForceFieldError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn add_bond_is_idempotent_across_orientations() {
        let mut template = water_template();
        template.add_bond(1, 0).unwrap();
        assert_eq!(template.bonds().len(), 2);
    }

    #[test]
    fn external_bonds_accumulate_per_atom() {
        let mut template = ResidueTemplate::new("ALA");
        template.add_atom(TemplateAtom::new("N", "N", Some(Element::N)));
        template.add_atom(TemplateAtom::new("C", "C", Some(Element::C)));
        template.add_external_bond(0).unwrap();
        template.add_external_bond(1).unwrap();
        assert_eq!(template.atoms()[0].external_bonds, 1);
        assert_eq!(template.atoms()[1].external_bonds, 1);
        assert!(template.add_external_bond(5).is_err());
    }

    #[test]
    fn with_charge_sets_per_atom_charge() {
        let atom = TemplateAtom::new("O", "tip3p-O", Some(Element::O)).with_charge(-0.834);
        assert_eq!(atom.charge, Some(-0.834));
    }
}
