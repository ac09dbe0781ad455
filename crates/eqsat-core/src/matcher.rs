//! Backtracking e-matching: find every `(substitution, e-class)` pair under
//! which a [`Pattern`] structurally conforms to some e-node in that class.

use std::rc::Rc;

use crate::{
    egraph::EGraph,
    term::{Pattern, Subst},
    union_find::EClassId,
};

impl EGraph {
    /// All matches of `pattern` against every live e-class, collected
    /// eagerly (the match sets this engine deals with are always small).
    #[must_use]
    pub fn ematch(&self, pattern: &Pattern) -> Vec<(Subst, EClassId)> {
        let mut out = Vec::new();
        for class in self.classes() {
            for subst in self.walk(pattern, class, &Subst::new()) {
                out.push((subst, class));
            }
        }
        out
    }

    fn walk(&self, pattern: &Pattern, class: EClassId, subst: &Subst) -> Vec<Subst> {
        match pattern {
            Pattern::Var(v) => match subst.get(v) {
                None => {
                    let mut bound = subst.clone();
                    bound.insert(Rc::clone(v), self.find(class).unwrap_or_else(|_| unreachable!()));
                    vec![bound]
                },
                Some(&bound) if bound == self.find(class).unwrap_or_else(|_| unreachable!()) => vec![subst.clone()],
                Some(_) => vec![],
            },
            Pattern::Node(op, kids) => {
                let root = self.find(class).unwrap_or_else(|_| unreachable!());
                let Some(nodes) = self.get_nodes(root).unwrap_or_else(|_| unreachable!()) else {
                    return vec![];
                };

                let mut out = Vec::new();
                for node in nodes {
                    if node.op() != &**op || node.args().len() != kids.len() {
                        continue;
                    }

                    let mut candidates = vec![subst.clone()];
                    for (sub_pattern, &child) in kids.iter().zip(node.args()) {
                        candidates = candidates
                            .iter()
                            .flat_map(|candidate| self.walk(sub_pattern, child, candidate))
                            .collect();
                        if candidates.is_empty() {
                            break;
                        }
                    }
                    out.extend(candidates);
                }
                out
            },
        }
    }
}
