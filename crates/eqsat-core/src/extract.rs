//! Smallest-term extraction: pick a minimum-node-count acyclic witness from
//! an e-class, guarding against cycles introduced by merges.

use hashbrown::HashSet;

use crate::{egraph::EGraph, term::Term, union_find::EClassId};

impl EGraph {
    /// The minimum-node-count term reachable from `class`, together with its
    /// size, or `None` if no acyclic witness exists (never happens for a
    /// class reached from [`EGraph::add_term`] of a ground term).
    #[must_use]
    pub fn extract_smallest(&self, class: EClassId) -> Option<(Term, usize)> {
        self.extract(&HashSet::new(), isize::MAX, class)
    }

    fn extract(&self, visited: &HashSet<EClassId>, bound: isize, class: EClassId) -> Option<(Term, usize)> {
        let class = self.find(class).unwrap_or_else(|_| unreachable!());

        if bound < 0 || visited.contains(&class) {
            return None;
        }

        let nodes = self.get_nodes(class).unwrap_or_else(|_| unreachable!())?;

        let mut visited = visited.clone();
        visited.insert(class);

        let mut best: Option<(Term, usize)> = None;
        let mut best_size = bound;

        for node in nodes {
            let mut children = Vec::with_capacity(node.args().len());
            let mut acc: isize = 1;
            let mut ok = true;

            for &child in node.args() {
                let Some((term, size)) = self.extract(&visited, best_size - acc, child) else {
                    ok = false;
                    break;
                };
                acc += size as isize;
                children.push(term);
            }

            if ok && acc <= best_size {
                best_size = acc;
                best = Some((Term::node(node.op().to_string(), children), acc as usize));
            }
        }

        best
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::term::Term;

    #[test]
    fn extracts_ground_term_unchanged_with_no_rewrites() {
        let mut eg = EGraph::new();
        let t = Term::node("+", vec![Term::leaf("a"), Term::leaf("b")]);
        let root = eg.add_term(&t).unwrap();
        let (extracted, size) = eg.extract_smallest(root).unwrap();
        assert_eq!(extracted, t);
        assert_eq!(size, 3);
    }

    #[test]
    fn extracts_smaller_equivalent_after_merge() {
        let mut eg = EGraph::new();
        let big = Term::node("+", vec![Term::leaf("a"), Term::leaf("b")]);
        let root = eg.add_term(&big).unwrap();
        let small = eg.add_term(&Term::leaf("c")).unwrap();

        {
            let mut w = eg.write();
            w.merge(root, small).unwrap();
        }

        let (extracted, size) = eg.extract_smallest(root).unwrap();
        assert_eq!(extracted, Term::leaf("c"));
        assert_eq!(size, 1);
    }

    #[test]
    fn cycle_guard_finds_acyclic_witness_in_cyclic_class() {
        let mut eg = EGraph::new();
        let a = eg.add_term(&Term::leaf("a")).unwrap();
        let fa = eg.add("f", [a]).unwrap();

        // Force a self-referential e-class: merge f(a)'s class with a's
        // class, so f(a) ends up a member of the very class it refers to.
        {
            let mut w = eg.write();
            w.merge(a, fa).unwrap();
        }

        let (extracted, size) = eg.extract_smallest(a).unwrap();
        assert_eq!(extracted, Term::leaf("a"));
        assert_eq!(size, 1);
    }
}
