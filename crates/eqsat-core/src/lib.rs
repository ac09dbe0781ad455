//! E-graph and equality-saturation engine: hash-consed e-nodes, a
//! congruence-closure-preserving e-graph, a backtracking e-matcher, a
//! cycle-safe smallest-term extractor, and the saturation loop around them.

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod egraph;
pub mod extract;
pub mod matcher;
pub mod saturate;
pub mod term;
pub mod union_find;

#[cfg(any(test, feature = "proptest"))]
pub mod prop {
    //! Strategies for property-testing against a naive reference model.

    use proptest::prelude::*;

    use crate::union_find::{EClassId, UnionFind};

    /// A sequence of union operations over `n` singleton sets, as indices.
    pub fn union_sequence(n: usize, len: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
        proptest::collection::vec((0..n, 0..n), 0..len)
    }

    /// Build a fresh union-find of `n` singletons together with its `EClassId` keys.
    #[must_use]
    pub fn fresh(n: usize) -> (UnionFind, Vec<EClassId>) {
        let mut uf = UnionFind::new();
        let ids = (0..n).map(|_| uf.extend()).collect();
        (uf, ids)
    }
}
