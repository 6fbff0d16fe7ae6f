use super::error::ForceFieldError;
use super::selector::Selector;
use serde::Deserialize;
use std::path::Path;

/// A declarative force-field definition document.
///
/// Documents are TOML with a fixed schema; unknown keys are rejected at parse
/// time rather than silently accepted. A force field may be assembled from
/// several documents merged in listed order — later documents add to earlier
/// ones and must not conflict on overlapping keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForceFieldDocument {
    #[serde(default)]
    pub atom_types: Vec<AtomTypeEntry>,
    #[serde(default)]
    pub residues: Vec<ResidueEntry>,
    pub harmonic_bond: Option<HarmonicBondSection>,
    pub harmonic_angle: Option<HarmonicAngleSection>,
    pub periodic_torsion: Option<PeriodicTorsionSection>,
    pub nonbonded: Option<NonbondedSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtomTypeEntry {
    pub name: String,
    pub class: String,
    /// Element symbol; omit for element-agnostic placeholder types.
    pub element: Option<String>,
    pub mass: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResidueEntry {
    pub name: String,
    pub atoms: Vec<ResidueAtomEntry>,
    #[serde(default)]
    pub bonds: Vec<[usize; 2]>,
    /// Indices of atoms that bond outward; listing an index twice declares
    /// two external bonds on that atom.
    #[serde(default)]
    pub external_bonds: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResidueAtomEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub charge: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarmonicBondSection {
    pub bonds: Vec<BondEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BondEntry {
    pub type1: Option<String>,
    pub class1: Option<String>,
    pub type2: Option<String>,
    pub class2: Option<String>,
    pub length: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarmonicAngleSection {
    pub angles: Vec<AngleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AngleEntry {
    pub type1: Option<String>,
    pub class1: Option<String>,
    pub type2: Option<String>,
    pub class2: Option<String>,
    pub type3: Option<String>,
    pub class3: Option<String>,
    pub angle: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodicTorsionSection {
    #[serde(default)]
    pub propers: Vec<TorsionEntry>,
    #[serde(default)]
    pub impropers: Vec<TorsionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TorsionEntry {
    pub type1: Option<String>,
    pub class1: Option<String>,
    pub type2: Option<String>,
    pub class2: Option<String>,
    pub type3: Option<String>,
    pub class3: Option<String>,
    pub type4: Option<String>,
    pub class4: Option<String>,
    pub periodicity: u32,
    pub phase: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonbondedSection {
    pub coulomb14_scale: f64,
    pub lj14_scale: f64,
    /// When true, particle charges come from residue template atoms.
    #[serde(default)]
    pub charge_from_residue: bool,
    pub atoms: Vec<NonbondedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonbondedEntry {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub class: Option<String>,
    pub charge: Option<f64>,
    pub sigma: f64,
    pub epsilon: f64,
}

impl ForceFieldDocument {
    /// Parses a document from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ForceFieldError> {
        toml::from_str(content).map_err(|e| ForceFieldError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })
    }

    /// Reads and parses a document from a file.
    pub fn from_path(path: &Path) -> Result<Self, ForceFieldError> {
        let content = std::fs::read_to_string(path).map_err(|e| ForceFieldError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ForceFieldError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

/// Converts a `type`/`class` attribute pair into a [`Selector`].
///
/// Exactly one of the two must be present; an empty string means wildcard.
pub(crate) fn selector_from(
    type_name: Option<&str>,
    class: Option<&str>,
    context: &'static str,
    position: usize,
) -> Result<Selector, ForceFieldError> {
    match (type_name, class) {
        (Some(t), None) => Ok(if t.is_empty() {
            Selector::Any
        } else {
            Selector::Type(t.to_string())
        }),
        (None, Some(c)) => Ok(if c.is_empty() {
            Selector::Any
        } else {
            Selector::Class(c.to_string())
        }),
        _ => Err(ForceFieldError::InvalidSelector { context, position }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TIP3P_DOCUMENT: &str = r#"
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
            { type = "tip3p-O", charge = -0.834, sigma = 0.31507524065751241, epsilon = 0.635968 },
            { type = "tip3p-H", charge = 0.417, sigma = 1.0, epsilon = 0.0 },
        ]
    "#;

    #[test]
    fn from_toml_str_parses_a_complete_document() {
        let doc = ForceFieldDocument::from_toml_str(TIP3P_DOCUMENT).unwrap();

        assert_eq!(doc.atom_types.len(), 2);
        assert_eq!(doc.atom_types[0].name, "tip3p-O");
        assert_eq!(doc.atom_types[0].element.as_deref(), Some("O"));

        assert_eq!(doc.residues.len(), 1);
        let hoh = &doc.residues[0];
        assert_eq!(hoh.name, "HOH");
        assert_eq!(hoh.atoms.len(), 3);
        assert_eq!(hoh.atoms[1].type_name, "tip3p-H");
        assert_eq!(hoh.bonds, vec![[0, 1], [0, 2]]);
        assert!(hoh.external_bonds.is_empty());

        let bonds = doc.harmonic_bond.unwrap();
        assert_eq!(bonds.bonds.len(), 1);
        assert_eq!(bonds.bonds[0].class1.as_deref(), Some("OW"));

        let nonbonded = doc.nonbonded.unwrap();
        assert_eq!(nonbonded.coulomb14_scale, 0.833333);
        assert!(!nonbonded.charge_from_residue);
        assert_eq!(nonbonded.atoms.len(), 2);
    }

    #[test]
    fn from_toml_str_rejects_unknown_keys() {
        let result = ForceFieldDocument::from_toml_str(
            r#"
            [[atom_types]]
            name = "C"
            class = "C"
            mass = 12.0
            color = "black"
            "#,
        );
        assert!(matches!(result, Err(ForceFieldError::Toml { .. })));
    }

    #[test]
    fn from_toml_str_rejects_malformed_toml() {
        let result = ForceFieldDocument::from_toml_str("this is not toml");
        assert!(matches!(result, Err(ForceFieldError::Toml { .. })));
    }

    #[test]
    fn from_path_reads_a_document_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tip3p.toml");
        fs::write(&path, TIP3P_DOCUMENT).unwrap();

        let doc = ForceFieldDocument::from_path(&path).unwrap();
        assert_eq!(doc.atom_types.len(), 2);
    }

    #[test]
    fn from_path_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        let result = ForceFieldDocument::from_path(&path);
        assert!(matches!(result, Err(ForceFieldError::Io { .. })));
    }

    #[test]
    fn selector_from_maps_empty_string_to_wildcard() {
        let sel = selector_from(Some(""), None, "test", 1).unwrap();
        assert_eq!(sel, Selector::Any);
        let sel = selector_from(None, Some(""), "test", 1).unwrap();
        assert_eq!(sel, Selector::Any);
    }

    #[test]
    fn selector_from_requires_exactly_one_attribute() {
        assert!(matches!(
            selector_from(Some("C"), Some("C"), "test", 2),
            Err(ForceFieldError::InvalidSelector { position: 2, .. })
        ));
        assert!(matches!(
            selector_from(None, None, "test", 3),
            Err(ForceFieldError::InvalidSelector { position: 3, .. })
        ));
    }

    #[test]
    fn wildcards_parse_in_torsion_entries() {
        let doc = ForceFieldDocument::from_toml_str(
            r#"
            [periodic_torsion]
            propers = [
                { type1 = "", type2 = "C", type3 = "C", type4 = "", periodicity = 2, phase = 3.141593, k = 15.167 },
            ]
            impropers = [
                { class1 = "C", class2 = "", class3 = "", class4 = "O", periodicity = 2, phase = 3.141593, k = 43.932 },
            ]
            "#,
        )
        .unwrap();

        let torsions = doc.periodic_torsion.unwrap();
        assert_eq!(torsions.propers.len(), 1);
        assert_eq!(torsions.impropers.len(), 1);
        assert_eq!(torsions.propers[0].type1.as_deref(), Some(""));
    }
}
