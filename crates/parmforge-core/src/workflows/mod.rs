//! # Workflows Module
//!
//! The public API layer: complete parameterization procedures that tie the
//! `core` registries and the `engine` algorithms together.
//!
//! [`build`] exposes `create_system` (and its opaque-sink form `build_into`)
//! plus the query companions `unmatched_residues`, `matching_templates`, and
//! `generate_templates_for_unmatched_residues`.

pub mod build;
