use thiserror::Error;

/// Errors raised while constructing a force field, either programmatically
/// or from declarative documents.
///
/// Every variant is fatal and synchronous: a force field that fails to build
/// performs no matching. Document-level failures surface before any topology
/// is examined.
#[derive(Debug, Error)]
pub enum ForceFieldError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("Duplicate atom type '{0}'")]
    DuplicateAtomType(String),

    #[error("Duplicate residue template '{0}'")]
    DuplicateTemplate(String),

    #[error("Template '{template}' references unknown atom type '{type_name}'")]
    UnknownAtomType { template: String, type_name: String },

    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),

    #[error("Invalid template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error(
        "Conflicting values for {name} across merged documents: {first} vs {second} (tolerance {tolerance})"
    )]
    ScaleFactorConflict {
        name: &'static str,
        first: f64,
        second: f64,
        tolerance: f64,
    },

    #[error("Merged documents disagree on whether charges come from residue attributes")]
    ChargeSourceConflict,

    #[error("Rule selector {position} in {context} must set exactly one of type or class")]
    InvalidSelector {
        context: &'static str,
        position: usize,
    },
}
