//! # Core Module
//!
//! This module provides the fundamental building blocks for force-field
//! parameterization: the molecular data model and the force-field definition
//! registries.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules:
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, bonds,
//!   and the `Topology` graph that owns them
//! - **Force-Field Definitions** ([`forcefield`]) - Atom types, residue templates,
//!   generator rule sets, and the declarative TOML document loader
//! - **Utilities** ([`utils`]) - Parallel-iteration shims and small geometry helpers

pub mod forcefield;
pub mod models;
pub mod utils;
