//! Force-field definitions: atom types, residue templates, generator rule
//! sets, and the declarative document loader.
//!
//! A [`library::ForceField`] owns every registry. It is built once, either
//! programmatically through the `register_*` API or by merging one or more
//! TOML documents in listed order, and is immutable during a build except
//! for on-demand template registration performed by template-generator
//! hooks.

pub mod document;
pub mod error;
pub mod generators;
pub mod library;
pub mod selector;
pub mod template;
pub mod types;
