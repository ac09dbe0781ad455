//! A disjoint-set data structure over dense integer keys, with path
//! compression and union-by-rank.

use std::{cell::Cell, cmp::Ordering, fmt};

use hashbrown::HashMap;

/// An opaque, dense identifier for an e-class.
///
/// Two ids denote the same class iff [`UnionFind::find`] maps them to the
/// same root. `EClassId`s absorbed by a [`union`](UnionFind::union) remain
/// valid keys for `find` (they just stop being roots); they must never be
/// used to index into a table keyed by *canonical* ids without first calling
/// `find`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EClassId(usize);

impl EClassId {
    #[must_use]
    pub(crate) const fn new(id: usize) -> Self { Self(id) }

    #[must_use]
    pub fn index(self) -> usize { self.0 }
}

impl fmt::Debug for EClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(id) = self;
        write!(f, "e{id}")
    }
}

/// The requested key has no corresponding node in this union-find.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("no union-find node with id {0:?}")]
pub struct NoNode(pub EClassId);

/// The result of a successful [`UnionFind::union`]: which root survived and
/// which was absorbed into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Union {
    /// The id that now represents the merged class.
    pub root: EClassId,
    /// The id that was absorbed; no longer a root.
    pub child: EClassId,
}

struct Node {
    parent: Cell<usize>,
    rank: usize,
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            parent: Cell::new(self.parent.get()),
            rank: self.rank,
        }
    }
}

/// A disjoint-set data structure over `EClassId`.
#[derive(Clone, Default)]
pub struct UnionFind(Vec<Node>);

impl fmt::Debug for UnionFind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_map();
        for (id, node) in self.0.iter().enumerate() {
            let parent = node.parent.get();
            m.entry(&id, &(parent != id).then_some(parent));
        }
        m.finish()
    }
}

impl UnionFind {
    /// Construct an empty union-find.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of keys ever allocated (including absorbed ones).
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Allocate a new singleton set, returning its key.
    pub fn extend(&mut self) -> EClassId {
        let id = self.0.len();
        self.0.push(Node {
            parent: Cell::new(id),
            rank: 0,
        });
        EClassId::new(id)
    }

    /// All keys ever allocated, in allocation order (not deduplicated by
    /// class; use [`UnionFind::roots`] for that).
    pub fn classes(&self) -> impl Iterator<Item = EClassId> + '_ {
        (0..self.0.len()).map(EClassId::new)
    }

    /// The distinct root ids currently live in this union-find.
    pub fn roots(&self) -> impl Iterator<Item = EClassId> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|&(id, node)| node.parent.get() == id)
            .map(|(id, _)| EClassId::new(id))
    }

    /// Find the representative of `key`'s set, compressing the path walked.
    ///
    /// # Errors
    /// Returns [`NoNode`] if `key` was never allocated by this union-find.
    pub fn find(&self, key: EClassId) -> Result<EClassId, NoNode> {
        let idx = key.index();
        let node = self.0.get(idx).ok_or(NoNode(key))?;
        let parent = node.parent.get();

        if parent == idx {
            return Ok(key);
        }

        let root = self.find(EClassId::new(parent)).unwrap_or_else(|_| unreachable!(
            "a live union-find never has a dangling parent pointer"
        ));
        node.parent.set(root.index());

        Ok(root)
    }

    /// Returns `true` if `a` and `b` are in the same set.
    ///
    /// # Errors
    /// Returns [`NoNode`] if either key was never allocated.
    pub fn connected(&self, a: EClassId, b: EClassId) -> Result<bool, NoNode> {
        Ok(self.find(a)? == self.find(b)?)
    }

    /// Union the sets containing `a` and `b`.
    ///
    /// Attaches the lower-rank root under the higher-rank one; ties are
    /// broken by keeping `a`'s root as the survivor, and only on a tie does
    /// the survivor's rank increase. Returns `Ok(None)` if `a` and `b` were
    /// already in the same set.
    ///
    /// # Errors
    /// Returns [`NoNode`] if either key was never allocated.
    pub fn union(&mut self, a: EClassId, b: EClassId) -> Result<Option<Union>, NoNode> {
        let ra = self.find(a)?;
        let rb = self.find(b)?;

        if ra == rb {
            return Ok(None);
        }

        let rank_a = self.0[ra.index()].rank;
        let rank_b = self.0[rb.index()].rank;

        let (root, child) = match rank_a.cmp(&rank_b) {
            Ordering::Less => (rb, ra),
            Ordering::Greater => (ra, rb),
            Ordering::Equal => {
                self.0[ra.index()].rank += 1;
                (ra, rb)
            },
        };

        self.0[child.index()].parent.set(root.index());

        Ok(Some(Union { root, child }))
    }

    /// Group every live key by its root. Intended for debugging/testing.
    pub fn disjoint_sets(&self) -> HashMap<EClassId, Vec<EClassId>> {
        let mut out: HashMap<EClassId, Vec<EClassId>> = HashMap::new();
        for key in self.classes() {
            let root = self.find(key).unwrap_or_else(|_| unreachable!());
            out.entry(root).or_default().push(key);
        }
        out
    }
}


#[cfg(feature = "proptest")]
mod proptests {
    use proptest::prelude::*;

    use super::UnionFind;
    use crate::prop::union_sequence;

    proptest! {
        #[test]
        fn matches_reference_model_for_any_union_sequence(ops in union_sequence(16, 64)) {
            let mut uf = UnionFind::new();
            let ids: Vec<_> = (0..16).map(|_| uf.extend()).collect();
            let mut reference: Vec<usize> = (0..16).collect();

            for (i, j) in ops {
                uf.union(ids[i], ids[j]).unwrap();

                let (ra, rb) = (reference[i], reference[j]);
                if ra != rb {
                    for v in &mut reference {
                        if *v == rb {
                            *v = ra;
                        }
                    }
                }
            }

            for i in 0..16 {
                for j in 0..16 {
                    prop_assert_eq!(
                        uf.connected(ids[i], ids[j]).unwrap(),
                        reference[i] == reference[j]
                    );
                }
            }
        }
    }
}
