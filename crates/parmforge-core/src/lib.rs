//! # Parmforge Core Library
//!
//! A library for force-field parameterization of molecular topologies: it matches
//! every residue of a topology against a library of residue templates (up to graph
//! isomorphism) and resolves bonded and nonbonded interaction parameters by
//! selector specificity, emitting the result through an opaque system-sink
//! interface. All numerically significant work (energy evaluation, integration,
//! long-range electrostatics) belongs to the consuming simulation engine.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Topology`),
//!   the force-field definition registries (`ForceField`: atom types, residue
//!   templates, generator rule sets), and the declarative document loader.
//!
//! - **[`engine`]: The Logic Core.** Implements the algorithms: the backtracking
//!   graph matcher, structural signatures and unmatched-residue handling, the
//!   build configuration, and the `SystemSink` seam with its recording `System`.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together to
//!   execute the complete parameterization procedure (`create_system` and its
//!   query companions). This is the entry point for end-users of the library.

pub mod core;
pub mod engine;
pub mod workflows;
