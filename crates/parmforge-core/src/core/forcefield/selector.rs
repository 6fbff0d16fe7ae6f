use super::types::AtomType;

/// A single position of a generator rule: matches an atom type by name, by
/// class, or unconditionally (wildcard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Matches exactly one atom type by its unique name.
    Type(String),
    /// Matches every atom type sharing the given class.
    Class(String),
    /// Matches any atom type.
    Any,
}

impl Selector {
    /// Checks whether this selector admits the given atom type.
    pub fn matches(&self, atom_type: &AtomType) -> bool {
        match self {
            Selector::Type(name) => atom_type.name == *name,
            Selector::Class(class) => atom_type.class == *class,
            Selector::Any => true,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Selector::Any)
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Selector::Type(_))
    }
}
