//! Data structures for representing molecular systems.
//!
//! A [`topology::Topology`] owns chains, residues, atoms, and bonds through
//! slotmap-backed storage; the remaining submodules define the records it
//! stores and the chemical element table.

pub mod atom;
pub mod chain;
pub mod element;
pub mod ids;
pub mod residue;
pub mod topology;
