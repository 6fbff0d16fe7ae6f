use super::document::{ForceFieldDocument, selector_from};
use super::error::ForceFieldError;
use super::generators::{
    AngleRule, BondRule, HarmonicAngleGenerator, HarmonicBondGenerator, NonbondedGenerator,
    NonbondedRule, PeriodicTorsionGenerator, TorsionRule,
};
use super::template::{ResidueTemplate, TemplateAtom};
use super::types::AtomType;
use crate::core::models::element::Element;
use crate::core::models::ids::ResidueId;
use crate::core::models::topology::Topology;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::info;

/// A template-generator hook: invoked for an unmatched residue, it may
/// register new templates (and supporting atom types) on the force field and
/// returns whether it parameterized the residue so matching should be retried.
pub type TemplateGenerator = Box<dyn FnMut(&mut ForceField, &Topology, ResidueId) -> bool>;

/// The force-field definition: atom types, residue templates, generator rule
/// sets, and template-generator hooks.
///
/// A `ForceField` is built once — programmatically or by merging declarative
/// documents in listed order — and then queried per topology. Its registries
/// are immutable while a build is in flight, except for on-demand template
/// registration performed by hooks on the coordinating thread.
#[derive(Default)]
pub struct ForceField {
    atom_types: HashMap<String, AtomType>,
    /// Templates in registration order; matching scans them in this order.
    templates: Vec<ResidueTemplate>,
    template_names: HashMap<String, usize>,
    bonds: HarmonicBondGenerator,
    angles: HarmonicAngleGenerator,
    torsions: PeriodicTorsionGenerator,
    nonbonded: Option<NonbondedGenerator>,
    template_generators: Vec<TemplateGenerator>,
}

impl ForceField {
    /// Creates a force field with empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a force field by merging the given documents in order.
    pub fn from_documents(
        documents: impl IntoIterator<Item = ForceFieldDocument>,
    ) -> Result<Self, ForceFieldError> {
        let mut forcefield = Self::new();
        for document in documents {
            forcefield.merge_document(document)?;
        }
        Ok(forcefield)
    }

    /// Builds a force field from TOML strings merged in order.
    pub fn from_toml_strs(contents: &[&str]) -> Result<Self, ForceFieldError> {
        let documents = contents
            .iter()
            .map(|content| ForceFieldDocument::from_toml_str(content))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_documents(documents)
    }

    /// Builds a force field from document files merged in order.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ForceFieldError> {
        let documents = paths
            .iter()
            .map(|path| ForceFieldDocument::from_path(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_documents(documents)
    }

    /// Registers an atom type.
    ///
    /// # Errors
    ///
    /// Returns [`ForceFieldError::DuplicateAtomType`] if a type with the same
    /// name is already registered.
    pub fn register_atom_type(&mut self, atom_type: AtomType) -> Result<(), ForceFieldError> {
        if self.atom_types.contains_key(&atom_type.name) {
            return Err(ForceFieldError::DuplicateAtomType(atom_type.name));
        }
        self.atom_types.insert(atom_type.name.clone(), atom_type);
        Ok(())
    }

    /// Looks up an atom type by name.
    pub fn atom_type(&self, name: &str) -> Option<&AtomType> {
        self.atom_types.get(name)
    }

    /// Iterates over all registered atom types, in no particular order.
    pub fn atom_types(&self) -> impl Iterator<Item = &AtomType> {
        self.atom_types.values()
    }

    /// Registers a residue template.
    ///
    /// Every template atom must reference a registered atom type; template
    /// atoms without an element inherit the element of their type.
    ///
    /// # Errors
    ///
    /// Returns [`ForceFieldError::DuplicateTemplate`] for a name collision,
    /// [`ForceFieldError::UnknownAtomType`] for an unregistered type
    /// reference, and [`ForceFieldError::InvalidTemplate`] for an empty
    /// template.
    pub fn register_residue_template(
        &mut self,
        mut template: ResidueTemplate,
    ) -> Result<(), ForceFieldError> {
        if template.atom_count() == 0 {
            return Err(ForceFieldError::InvalidTemplate {
                template: template.name.clone(),
                reason: "template has no atoms".to_string(),
            });
        }
        if self.template_names.contains_key(&template.name) {
            return Err(ForceFieldError::DuplicateTemplate(template.name));
        }
        let name = template.name.clone();
        for atom in template.atoms_mut() {
            let atom_type = self.atom_types.get(&atom.type_name).ok_or_else(|| {
                ForceFieldError::UnknownAtomType {
                    template: name.clone(),
                    type_name: atom.type_name.clone(),
                }
            })?;
            if atom.element.is_none() {
                atom.element = atom_type.element;
            }
        }
        self.template_names.insert(name, self.templates.len());
        self.templates.push(template);
        Ok(())
    }

    /// Returns the registered templates in registration order.
    pub fn templates(&self) -> &[ResidueTemplate] {
        &self.templates
    }

    /// Looks up a template by name.
    pub fn template_by_name(&self, name: &str) -> Option<&ResidueTemplate> {
        self.template_names
            .get(name)
            .map(|&index| &self.templates[index])
    }

    pub fn register_bond_rule(&mut self, rule: BondRule) {
        self.bonds.register(rule);
    }

    pub fn register_angle_rule(&mut self, rule: AngleRule) {
        self.angles.register(rule);
    }

    pub fn register_proper_rule(&mut self, rule: TorsionRule) {
        self.torsions.register_proper(rule);
    }

    pub fn register_improper_rule(&mut self, rule: TorsionRule) {
        self.torsions.register_improper(rule);
    }

    /// Registers a nonbonded rule set, merging with any existing one.
    ///
    /// # Errors
    ///
    /// Propagates the scale-factor tolerance check of
    /// [`NonbondedGenerator::merge`].
    pub fn register_nonbonded(
        &mut self,
        generator: NonbondedGenerator,
    ) -> Result<(), ForceFieldError> {
        match &mut self.nonbonded {
            Some(existing) => existing.merge(generator),
            None => {
                self.nonbonded = Some(generator);
                Ok(())
            }
        }
    }

    pub fn bond_generator(&self) -> &HarmonicBondGenerator {
        &self.bonds
    }

    pub fn angle_generator(&self) -> &HarmonicAngleGenerator {
        &self.angles
    }

    pub fn torsion_generator(&self) -> &PeriodicTorsionGenerator {
        &self.torsions
    }

    pub fn nonbonded_generator(&self) -> Option<&NonbondedGenerator> {
        self.nonbonded.as_ref()
    }

    /// Registers a template-generator hook. Hooks run in registration order,
    /// once per distinct unmatched structure, serialized on the coordinating
    /// thread.
    pub fn register_template_generator(&mut self, generator: TemplateGenerator) {
        self.template_generators.push(generator);
    }

    /// Number of registered template-generator hooks.
    pub fn template_generator_count(&self) -> usize {
        self.template_generators.len()
    }

    /// Temporarily takes the hook list so the build workflow can invoke hooks
    /// that receive `&mut ForceField` without aliasing.
    pub(crate) fn take_template_generators(&mut self) -> Vec<TemplateGenerator> {
        std::mem::take(&mut self.template_generators)
    }

    /// Restores a hook list taken by [`Self::take_template_generators`],
    /// keeping any hooks the invoked hooks registered in the meantime.
    pub(crate) fn restore_template_generators(&mut self, mut generators: Vec<TemplateGenerator>) {
        generators.append(&mut self.template_generators);
        self.template_generators = generators;
    }

    /// Merges one declarative document into the registries.
    ///
    /// Sections merge in schema order: atom types first, so templates and
    /// rules of the same document may reference them.
    pub fn merge_document(&mut self, document: ForceFieldDocument) -> Result<(), ForceFieldError> {
        for entry in &document.atom_types {
            let element = match &entry.element {
                Some(symbol) => Some(
                    Element::from_symbol(symbol)
                        .ok_or_else(|| ForceFieldError::UnknownElement(symbol.clone()))?,
                ),
                None => None,
            };
            self.register_atom_type(AtomType::new(&entry.name, &entry.class, element, entry.mass))?;
        }

        for entry in &document.residues {
            let mut template = ResidueTemplate::new(&entry.name);
            for atom in &entry.atoms {
                let mut template_atom = TemplateAtom::new(&atom.name, &atom.type_name, None);
                template_atom.charge = atom.charge;
                template.add_atom(template_atom);
            }
            for &[a, b] in &entry.bonds {
                template.add_bond(a, b)?;
            }
            for &index in &entry.external_bonds {
                template.add_external_bond(index)?;
            }
            self.register_residue_template(template)?;
        }

        if let Some(section) = &document.harmonic_bond {
            for entry in &section.bonds {
                let selectors = [
                    selector_from(entry.type1.as_deref(), entry.class1.as_deref(), "harmonic_bond", 1)?,
                    selector_from(entry.type2.as_deref(), entry.class2.as_deref(), "harmonic_bond", 2)?,
                ];
                self.register_bond_rule(BondRule {
                    selectors,
                    length: entry.length,
                    k: entry.k,
                });
            }
        }

        if let Some(section) = &document.harmonic_angle {
            for entry in &section.angles {
                let selectors = [
                    selector_from(entry.type1.as_deref(), entry.class1.as_deref(), "harmonic_angle", 1)?,
                    selector_from(entry.type2.as_deref(), entry.class2.as_deref(), "harmonic_angle", 2)?,
                    selector_from(entry.type3.as_deref(), entry.class3.as_deref(), "harmonic_angle", 3)?,
                ];
                self.register_angle_rule(AngleRule {
                    selectors,
                    angle: entry.angle,
                    k: entry.k,
                });
            }
        }

        if let Some(section) = &document.periodic_torsion {
            for entry in &section.propers {
                self.register_proper_rule(torsion_rule_from(entry, "periodic_torsion")?);
            }
            for entry in &section.impropers {
                self.register_improper_rule(torsion_rule_from(entry, "periodic_torsion")?);
            }
        }

        if let Some(section) = &document.nonbonded {
            let mut generator = NonbondedGenerator::new(section.coulomb14_scale, section.lj14_scale);
            generator.charge_from_residue = section.charge_from_residue;
            for entry in &section.atoms {
                let selector =
                    selector_from(entry.type_name.as_deref(), entry.class.as_deref(), "nonbonded", 1)?;
                generator.register(NonbondedRule {
                    selector,
                    charge: entry.charge,
                    sigma: entry.sigma,
                    epsilon: entry.epsilon,
                });
            }
            self.register_nonbonded(generator)?;
        }

        info!(
            atom_types = self.atom_types.len(),
            templates = self.templates.len(),
            "Merged force-field document."
        );
        Ok(())
    }
}

fn torsion_rule_from(
    entry: &super::document::TorsionEntry,
    context: &'static str,
) -> Result<TorsionRule, ForceFieldError> {
    let selectors = [
        selector_from(entry.type1.as_deref(), entry.class1.as_deref(), context, 1)?,
        selector_from(entry.type2.as_deref(), entry.class2.as_deref(), context, 2)?,
        selector_from(entry.type3.as_deref(), entry.class3.as_deref(), context, 3)?,
        selector_from(entry.type4.as_deref(), entry.class4.as_deref(), context, 4)?,
    ];
    Ok(TorsionRule {
        selectors,
        periodicity: entry.periodicity,
        phase: entry.phase,
        k: entry.k,
    })
}

impl fmt::Debug for ForceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceField")
            .field("atom_types", &self.atom_types.len())
            .field("templates", &self.templates.len())
            .field("bond_rules", &self.bonds.rules().len())
            .field("angle_rules", &self.angles.rules().len())
            .field("proper_rules", &self.torsions.propers().len())
            .field("improper_rules", &self.torsions.impropers().len())
            .field("nonbonded", &self.nonbonded.is_some())
            .field("template_generators", &self.template_generators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::selector::Selector;

    fn tip3p_types(forcefield: &mut ForceField) {
        forcefield
            .register_atom_type(AtomType::new("tip3p-O", "OW", Some(Element::O), 15.99943))
            .unwrap();
        forcefield
            .register_atom_type(AtomType::new("tip3p-H", "HW", Some(Element::H), 1.007947))
            .unwrap();
    }

    fn water_template() -> ResidueTemplate {
        let mut template = ResidueTemplate::new("HOH");
        template.add_atom(TemplateAtom::new("O", "tip3p-O", None));
        template.add_atom(TemplateAtom::new("H1", "tip3p-H", None));
        template.add_atom(TemplateAtom::new("H2", "tip3p-H", None));
        template.add_bond(0, 1).unwrap();
        template.add_bond(0, 2).unwrap();
        template
    }

    #[test]
    fn register_atom_type_rejects_duplicates() {
        let mut forcefield = ForceField::new();
        tip3p_types(&mut forcefield);
        let result = forcefield.register_atom_type(AtomType::new("tip3p-O", "OW", None, 16.0));
        assert!(matches!(
            result,
            Err(ForceFieldError::DuplicateAtomType(name)) if name == "tip3p-O"
        ));
    }

    #[test]
    fn register_template_backfills_elements_from_types() {
        let mut forcefield = ForceField::new();
        tip3p_types(&mut forcefield);
        forcefield.register_residue_template(water_template()).unwrap();

        let template = forcefield.template_by_name("HOH").unwrap();
        assert_eq!(template.atoms()[0].element, Some(Element::O));
        assert_eq!(template.atoms()[1].element, Some(Element::H));
    }

    #[test]
    fn register_template_rejects_unknown_types_and_duplicates() {
        let mut forcefield = ForceField::new();
        tip3p_types(&mut forcefield);

        let mut bad = ResidueTemplate::new("BAD");
        bad.add_atom(TemplateAtom::new("X", "no-such-type", None));
        assert!(matches!(
            forcefield.register_residue_template(bad),
            Err(ForceFieldError::UnknownAtomType { .. })
        ));

        forcefield.register_residue_template(water_template()).unwrap();
        assert!(matches!(
            forcefield.register_residue_template(water_template()),
            Err(ForceFieldError::DuplicateTemplate(name)) if name == "HOH"
        ));
    }

    #[test]
    fn register_template_rejects_empty_templates() {
        let mut forcefield = ForceField::new();
        let empty = ResidueTemplate::new("EMPTY");
        assert!(matches!(
            forcefield.register_residue_template(empty),
            Err(ForceFieldError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn merge_document_populates_every_registry() {
        let document = ForceFieldDocument::from_toml_str(
            r#"
            [[atom_types]]
            name = "tip3p-O"
            class = "OW"
            element = "O"
            mass = 15.99943

            [[atom_types]]
            name = "tip3p-H"
            class = "HW"
            element = "H"
            mass = 1.007947

            [[residues]]
            name = "HOH"
            atoms = [
                { name = "O", type = "tip3p-O" },
                { name = "H1", type = "tip3p-H" },
                { name = "H2", type = "tip3p-H" },
            ]
            bonds = [[0, 1], [0, 2]]

            [harmonic_bond]
            bonds = [{ class1 = "OW", class2 = "HW", length = 0.09572, k = 462750.4 }]

            [harmonic_angle]
            angles = [{ class1 = "HW", class2 = "OW", class3 = "HW", angle = 1.82421813418, k = 836.8 }]

            [nonbonded]
            coulomb14_scale = 0.833333
            lj14_scale = 0.5
            atoms = [
                { type = "tip3p-O", charge = -0.834, sigma = 0.315, epsilon = 0.636 },
                { type = "tip3p-H", charge = 0.417, sigma = 1.0, epsilon = 0.0 },
            ]
            "#,
        )
        .unwrap();

        let forcefield = ForceField::from_documents([document]).unwrap();
        assert!(forcefield.atom_type("tip3p-O").is_some());
        assert!(forcefield.template_by_name("HOH").is_some());
        assert_eq!(forcefield.bond_generator().rules().len(), 1);
        assert_eq!(forcefield.angle_generator().rules().len(), 1);
        let nonbonded = forcefield.nonbonded_generator().unwrap();
        assert_eq!(nonbonded.rules().len(), 2);
        assert_eq!(nonbonded.coulomb14_scale, 0.833333);
    }

    #[test]
    fn merge_document_rejects_unknown_element_symbols() {
        let document = ForceFieldDocument::from_toml_str(
            r#"
            [[atom_types]]
            name = "X"
            class = "X"
            element = "Xx"
            mass = 1.0
            "#,
        )
        .unwrap();
        assert!(matches!(
            ForceField::from_documents([document]),
            Err(ForceFieldError::UnknownElement(symbol)) if symbol == "Xx"
        ));
    }

    #[test]
    fn merging_documents_tolerates_close_scale_factors() {
        let first = r#"
            [nonbonded]
            coulomb14_scale = 0.833333
            lj14_scale = 0.5
            atoms = []
        "#;
        let second = r#"
            [nonbonded]
            coulomb14_scale = 0.8333373333333333
            lj14_scale = 0.5
            atoms = []
        "#;
        let forcefield = ForceField::from_toml_strs(&[first, second]).unwrap();
        assert_eq!(
            forcefield.nonbonded_generator().unwrap().coulomb14_scale,
            0.833333
        );
    }

    #[test]
    fn merging_documents_rejects_diverging_scale_factors() {
        let first = r#"
            [nonbonded]
            coulomb14_scale = 0.833333
            lj14_scale = 0.5
            atoms = []
        "#;
        let second = r#"
            [nonbonded]
            coulomb14_scale = 0.5
            lj14_scale = 0.5
            atoms = []
        "#;
        assert!(matches!(
            ForceField::from_toml_strs(&[first, second]),
            Err(ForceFieldError::ScaleFactorConflict { .. })
        ));
    }

    #[test]
    fn wildcard_torsions_from_documents_register_correctly() {
        let forcefield = ForceField::from_toml_strs(&[r#"
            [[atom_types]]
            name = "C"
            class = "C"
            element = "C"
            mass = 12.01

            [[atom_types]]
            name = "O"
            class = "O"
            element = "O"
            mass = 16.0

            [periodic_torsion]
            propers = [
                { type1 = "", type2 = "C", type3 = "C", type4 = "", periodicity = 2, phase = 3.141593, k = 15.167 },
            ]
            impropers = [
                { type1 = "C", type2 = "", type3 = "", type4 = "O", periodicity = 2, phase = 3.141593, k = 43.932 },
            ]
        "#])
        .unwrap();

        let torsions = forcefield.torsion_generator();
        assert_eq!(torsions.propers().len(), 1);
        assert_eq!(torsions.impropers().len(), 1);
        assert_eq!(torsions.propers()[0].selectors[0], Selector::Any);
        assert_eq!(
            torsions.propers()[0].selectors[1],
            Selector::Type("C".to_string())
        );
    }

    #[test]
    fn take_and_restore_preserves_hook_order() {
        let mut forcefield = ForceField::new();
        forcefield.register_template_generator(Box::new(|_, _, _| false));
        forcefield.register_template_generator(Box::new(|_, _, _| true));

        let taken = forcefield.take_template_generators();
        assert_eq!(taken.len(), 2);
        assert_eq!(forcefield.template_generator_count(), 0);

        // A hook registered while the originals are checked out (e.g. by a
        // running hook) must survive restoration, after the originals.
        forcefield.register_template_generator(Box::new(|_, _, _| false));
        forcefield.restore_template_generators(taken);
        assert_eq!(forcefield.template_generator_count(), 3);
    }
}
