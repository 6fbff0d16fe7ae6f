use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical elements that occur in biomolecular force fields.
///
/// The set is restricted to elements that appear in protein, nucleic acid,
/// solvent, ion, and common ligand parameter sets. Atoms whose element is
/// genuinely unknown (e.g. placeholder atom types synthesized for unmatched
/// residues) carry `Option<Element>::None` instead of a sentinel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    B,
    C,
    N,
    O,
    F,
    Na,
    Mg,
    Si,
    P,
    S,
    Cl,
    K,
    Ca,
    Mn,
    Fe,
    Co,
    Ni,
    Cu,
    Zn,
    Se,
    Br,
    Rb,
    Sr,
    I,
    Cs,
    Ba,
}

static ELEMENT_BY_SYMBOL: Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "B" => Element::B,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "Na" => Element::Na,
    "Mg" => Element::Mg,
    "Si" => Element::Si,
    "P" => Element::P,
    "S" => Element::S,
    "Cl" => Element::Cl,
    "K" => Element::K,
    "Ca" => Element::Ca,
    "Mn" => Element::Mn,
    "Fe" => Element::Fe,
    "Co" => Element::Co,
    "Ni" => Element::Ni,
    "Cu" => Element::Cu,
    "Zn" => Element::Zn,
    "Se" => Element::Se,
    "Br" => Element::Br,
    "Rb" => Element::Rb,
    "Sr" => Element::Sr,
    "I" => Element::I,
    "Cs" => Element::Cs,
    "Ba" => Element::Ba,
};

impl Element {
    /// Returns the standard one- or two-letter symbol for this element.
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Co => "Co",
            Element::Ni => "Ni",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::Rb => "Rb",
            Element::Sr => "Sr",
            Element::I => "I",
            Element::Cs => "Cs",
            Element::Ba => "Ba",
        }
    }

    /// Returns the standard atomic mass in daltons.
    pub fn atomic_mass(&self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::B => 10.81,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::Na => 22.99,
            Element::Mg => 24.305,
            Element::Si => 28.085,
            Element::P => 30.974,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::K => 39.098,
            Element::Ca => 40.078,
            Element::Mn => 54.938,
            Element::Fe => 55.845,
            Element::Co => 58.933,
            Element::Ni => 58.693,
            Element::Cu => 63.546,
            Element::Zn => 65.38,
            Element::Se => 78.971,
            Element::Br => 79.904,
            Element::Rb => 85.468,
            Element::Sr => 87.62,
            Element::I => 126.9,
            Element::Cs => 132.91,
            Element::Ba => 137.33,
        }
    }

    /// Looks up an element by its case-sensitive symbol.
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        ELEMENT_BY_SYMBOL.get(symbol).copied()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown element symbol '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::from_symbol(s).ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_symbol_round_trips_every_element() {
        for (symbol, element) in ELEMENT_BY_SYMBOL.entries() {
            assert_eq!(element.symbol(), *symbol);
            assert_eq!(Element::from_symbol(symbol), Some(*element));
        }
    }

    #[test]
    fn from_symbol_is_case_sensitive() {
        assert_eq!(Element::from_symbol("Na"), Some(Element::Na));
        assert_eq!(Element::from_symbol("NA"), None);
        assert_eq!(Element::from_symbol("na"), None);
    }

    #[test]
    fn from_symbol_rejects_unknown_symbols() {
        assert_eq!(Element::from_symbol("Xx"), None);
        assert_eq!(Element::from_symbol(""), None);
    }

    #[test]
    fn atomic_masses_are_plausible() {
        assert_eq!(Element::H.atomic_mass(), 1.008);
        assert_eq!(Element::C.atomic_mass(), 12.011);
        assert_eq!(Element::O.atomic_mass(), 15.999);
        assert_eq!(Element::Fe.atomic_mass(), 55.845);
        assert!(Element::Cl.atomic_mass() > Element::O.atomic_mass());
    }

    #[test]
    fn from_str_parses_and_reports_errors() {
        assert_eq!("Cl".parse::<Element>(), Ok(Element::Cl));
        assert_eq!(
            "Q".parse::<Element>(),
            Err(ParseElementError("Q".to_string()))
        );
    }

    #[test]
    fn display_matches_symbol() {
        assert_eq!(Element::Mg.to_string(), "Mg");
        assert_eq!(Element::H.to_string(), "H");
    }
}
