use crate::core::models::element::Element;

/// A force-field atom type.
///
/// Atom types are the vocabulary the generator rules speak: every template
/// atom is bound to one type by name, and every rule selector matches either
/// a type name, a class name, or anything. The `class` is a many-to-one
/// grouping over types that lets one rule cover a family of types.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomType {
    /// Globally unique type name (e.g., "tip3p-O").
    pub name: String,
    /// Class name shared by related types (e.g., "OW").
    pub class: String,
    /// The chemical element, or `None` for element-agnostic placeholder types.
    pub element: Option<Element>,
    /// Mass in daltons.
    pub mass: f64,
}

impl AtomType {
    pub fn new(name: &str, class: &str, element: Option<Element>, mass: f64) -> Self {
        Self {
            name: name.to_string(),
            class: class.to_string(),
            element,
            mass,
        }
    }
}
