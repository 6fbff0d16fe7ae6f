//! # Engine Module
//!
//! The algorithmic core: template matching, structural deduplication of
//! unmatched residues, the build configuration, and the system-sink seam.
//!
//! Everything in this module is read-only over the [`Topology`] and the
//! force-field registries; mutation (template registration by hooks) is
//! orchestrated exclusively by the [`crate::workflows`] layer.
//!
//! [`Topology`]: crate::core::models::topology::Topology

pub mod config;
pub mod error;
pub mod matcher;
pub mod signature;
pub mod system;
pub mod unmatched;
