//! Abstraction layer for parallel iteration.
//!
//! This module provides conditional compilation for parallel processing.
//! When the `parallel` feature is enabled, it exports Rayon's parallelism
//! primitives. When disabled, it provides serial fallbacks that mimic the
//! parallel API, allowing internal code to be written once.
//!
//! Only the template-matching phase iterates through this module; it is
//! read-only over the topology and the force-field registries, so residues
//! can be matched independently. Anything that may mutate a registry
//! (template-generator hooks in particular) must stay on the coordinating
//! thread and never goes through these iterators.

#[cfg(feature = "parallel")]
pub use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

#[cfg(not(feature = "parallel"))]
pub use self::fallback::*;

#[cfg(not(feature = "parallel"))]
mod fallback {
    pub use std::iter::Iterator as ParallelIterator;

    /// Shim trait to allow `par_iter()` on types that implement `IntoIterator` for `&T`.
    pub trait IntoParallelRefIterator<'data> {
        type Item;
        type Iter: Iterator<Item = Self::Item>;
        fn par_iter(&'data self) -> Self::Iter;
    }

    impl<'data, I: 'data + ?Sized> IntoParallelRefIterator<'data> for I
    where
        &'data I: IntoIterator,
    {
        type Item = <&'data I as IntoIterator>::Item;
        type Iter = <&'data I as IntoIterator>::IntoIter;
        fn par_iter(&'data self) -> Self::Iter {
            self.into_iter()
        }
    }
}
