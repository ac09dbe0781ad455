//! The e-graph: hash-consed e-nodes over union-find e-classes, and the
//! congruence-closure rebuild that keeps the two in step after a merge.

use std::{fmt, rc::Rc};

use hashbrown::{HashMap, HashSet};

use crate::{
    term::{Pattern, Subst, Symbol, Term},
    union_find::{EClassId, NoNode, Union, UnionFind},
};

/// A single operator application over e-class children.
///
/// Two e-nodes are equal iff their `op` and `args` are equal; this is the
/// structural comparison the hashcons relies on, so an `ENode` is immutable
/// once built ([`ENode::canonicalize`] returns a new value rather than
/// mutating in place).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ENode(Symbol, Rc<[EClassId]>);

impl ENode {
    #[must_use]
    pub fn new(op: Symbol, args: impl Into<Rc<[EClassId]>>) -> Self { Self(op, args.into()) }

    #[must_use]
    pub fn op(&self) -> &str { &self.0 }

    #[must_use]
    pub fn args(&self) -> &[EClassId] { &self.1 }

    fn canonicalize(&self, uf: &UnionFind) -> Result<Self, NoNode> {
        let args = self.1.iter().map(|&c| uf.find(c)).collect::<Result<Rc<[EClassId]>, _>>()?;
        Ok(Self(Rc::clone(&self.0), args))
    }
}

impl fmt::Debug for ENode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(op, args) = self;
        f.debug_tuple("ENode").field(op).field(args).finish()
    }
}

struct EClassData {
    nodes: HashSet<ENode>,
    original_node: ENode,
    parents: HashMap<ENode, EClassId>,
}

impl EClassData {
    fn new(node: ENode) -> Self {
        Self {
            nodes: [node.clone()].into_iter().collect(),
            original_node: node,
            parents: HashMap::new(),
        }
    }
}

type HashCons = HashMap<ENode, EClassId>;

/// A hash-consed e-graph: a union-find over e-classes, each holding the set
/// of e-nodes it contains, backed by a structural index (the hashcons) that
/// enforces congruence.
pub struct EGraph {
    uf: UnionFind,
    classes: HashMap<EClassId, EClassData>,
    hashcons: HashCons,
}

impl fmt::Debug for EGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EGraph")
            .field("class_count", &self.classes.len())
            .field("node_count", &self.hashcons.len())
            .finish()
    }
}

impl Default for EGraph {
    fn default() -> Self { Self::new() }
}

impl EGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uf: UnionFind::new(),
            classes: HashMap::new(),
            hashcons: HashMap::new(),
        }
    }

    /// Number of live e-classes.
    #[must_use]
    pub fn class_count(&self) -> usize { self.classes.len() }

    /// Number of distinct e-nodes recorded in the hashcons.
    #[must_use]
    pub fn node_count(&self) -> usize { self.hashcons.len() }

    /// Every live (canonical) e-class id, in no particular order.
    pub fn classes(&self) -> impl Iterator<Item = EClassId> + '_ { self.classes.keys().copied() }

    /// The representative id of `class`'s equivalence class.
    ///
    /// # Errors
    /// Returns [`NoNode`] if `class` was never allocated by this e-graph.
    pub fn find(&self, class: EClassId) -> Result<EClassId, NoNode> { self.uf.find(class) }

    /// The e-nodes belonging to `class`, or `None` if its root has been
    /// repaired away (should not happen for an id returned by this e-graph).
    ///
    /// # Errors
    /// Returns [`NoNode`] if `class` was never allocated by this e-graph.
    pub fn get_nodes(&self, class: EClassId) -> Result<Option<&HashSet<ENode>>, NoNode> {
        let root = self.uf.find(class)?;
        Ok(self.classes.get(&root).map(|data| &data.nodes))
    }

    /// Open a mutation scope. Merges recorded through the returned guard are
    /// batched and only drive a congruence-closure rebuild when it drops.
    pub fn write(&mut self) -> EGraphMut<'_> {
        EGraphMut {
            eg: self,
            dirty: HashMap::new(),
        }
    }

    /// Insert `(op, args)`, deduplicating against any structurally equal
    /// e-node already present.
    ///
    /// # Errors
    /// Returns [`NoNode`] if an argument is not a valid id in this e-graph.
    pub fn add(&mut self, op: impl Into<Symbol>, args: impl Into<Rc<[EClassId]>>) -> Result<EClassId, NoNode> {
        self.add_node(ENode::new(op.into(), args.into()))
    }

    fn add_node(&mut self, node: ENode) -> Result<EClassId, NoNode> {
        let node = node.canonicalize(&self.uf)?;

        if let Some(&class) = self.hashcons.get(&node) {
            return Ok(class);
        }

        let class = self.uf.extend();

        for &child in node.args() {
            self.classes
                .get_mut(&child)
                .unwrap_or_else(|| unreachable!("canonical argument must already own class data"))
                .parents
                .insert(node.clone(), class);
        }

        self.classes.insert(class, EClassData::new(node.clone()));
        self.hashcons.insert(node, class);

        Ok(class)
    }

    /// Insert a ground term, recursively inserting its children first.
    ///
    /// # Errors
    /// Returns [`NoNode`] only if `term` somehow references an id from a
    /// different e-graph, which cannot happen through the public API; this
    /// is exposed for completeness, not because failure is expected.
    pub fn add_term(&mut self, term: &Term) -> Result<EClassId, NoNode> {
        let args = term
            .children
            .iter()
            .map(|child| self.add_term(child))
            .collect::<Result<Rc<[EClassId]>, _>>()?;

        self.add_node(ENode::new(Rc::clone(&term.op), args))
    }

    /// Instantiate `pattern` under `subst`, inserting any new e-nodes this
    /// requires.
    ///
    /// # Panics
    /// Panics if `pattern` references a variable not bound in `subst`; this
    /// is a programmer error, not a runtime condition: [`crate::term::Rewrite::well_formed`]
    /// should be checked once at rule-construction time, and saturation only
    /// ever calls this with a substitution produced by matching the rule's
    /// own left-hand side.
    #[must_use]
    pub fn add_pattern(&mut self, subst: &Subst, pattern: &Pattern) -> EClassId {
        match pattern {
            Pattern::Var(v) => *subst
                .get(v)
                .unwrap_or_else(|| panic!("unbound pattern variable `?{v}` in add_pattern")),
            Pattern::Node(op, children) => {
                let args: Rc<[EClassId]> = children.iter().map(|child| self.add_pattern(subst, child)).collect();

                self.add_node(ENode::new(Rc::clone(op), args))
                    .unwrap_or_else(|_| unreachable!("add_pattern only builds nodes over this e-graph's own ids"))
            },
        }
    }
}

type DirtySet = HashMap<EClassId, HashSet<EClassId>>;

/// A scoped handle for batched e-graph mutation.
///
/// Every [`merge`](EGraphMut::merge) call only unions the underlying
/// union-find and notes the pair as dirty; the congruence-closure rebuild
/// that restores the invariants in full runs once, when the guard drops.
pub struct EGraphMut<'a> {
    eg: &'a mut EGraph,
    dirty: DirtySet,
}

impl fmt::Debug for EGraphMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EGraphMut").field("eg", self.eg).finish()
    }
}

impl Drop for EGraphMut<'_> {
    fn drop(&mut self) { self.rebuild(); }
}

impl EGraphMut<'_> {
    /// See [`EGraph::add`].
    ///
    /// # Errors
    /// Returns [`NoNode`] if an argument is not a valid id in this e-graph.
    pub fn add(&mut self, op: impl Into<Symbol>, args: impl Into<Rc<[EClassId]>>) -> Result<EClassId, NoNode> {
        self.eg.add(op, args)
    }

    /// See [`EGraph::add_term`].
    ///
    /// # Errors
    /// Returns [`NoNode`] under the same conditions as [`EGraph::add_term`].
    pub fn add_term(&mut self, term: &Term) -> Result<EClassId, NoNode> { self.eg.add_term(term) }

    /// See [`EGraph::add_pattern`].
    ///
    /// # Panics
    /// Panics under the same conditions as [`EGraph::add_pattern`].
    #[must_use]
    pub fn add_pattern(&mut self, subst: &Subst, pattern: &Pattern) -> EClassId { self.eg.add_pattern(subst, pattern) }

    /// Union the classes of `a` and `b`. The rebuild that restores
    /// congruence is deferred until this guard drops.
    ///
    /// # Errors
    /// Returns [`NoNode`] if either id is not valid in this e-graph.
    pub fn merge(&mut self, a: EClassId, b: EClassId) -> Result<Option<Union>, NoNode> {
        let union = self.eg.uf.union(a, b)?;

        if let Some(u) = union {
            self.dirty.entry(u.root).or_default().insert(u.child);
        }

        Ok(union)
    }

    fn rebuild(&mut self) {
        let _span = tracing::debug_span!("rebuild").entered();

        // Renames discovered while repairing one class must still be
        // resolvable when a later class in the same rebuild needs to evict
        // that e-node's previous (by-then-stale) hashcons key.
        let mut rewrites: HashMap<ENode, ENode> = HashMap::new();
        let mut queue = DirtySet::new();

        while !self.dirty.is_empty() {
            for (root, absorbed) in self.dirty.drain() {
                let root = self.eg.uf.find(root).unwrap_or_else(|_| unreachable!());
                queue.entry(root).or_default().extend(absorbed);
            }

            for (class, absorbed) in queue.drain() {
                self.repair(class, absorbed, &mut rewrites);
            }
        }
    }

    fn repair(&mut self, repair_class: EClassId, absorbed: HashSet<EClassId>, rewrites: &mut HashMap<ENode, ENode>) {
        let _span = tracing::trace_span!("repair", class = ?repair_class).entered();

        let mut data = self
            .eg
            .classes
            .remove(&repair_class)
            .unwrap_or_else(|| unreachable!("repair is only scheduled for a class that still owns data"));

        for o in absorbed {
            let Some(folded) = self.eg.classes.remove(&o) else {
                continue; // already folded earlier in this same rebuild round
            };

            // The absorbed class's creating node stops being canonical the
            // instant its class stops being a root. If it has no children it
            // is nobody's parent, so nothing else will ever revisit its
            // hashcons entry; fix it up here, directly, by its own key.
            self.eg.hashcons.remove(&folded.original_node);
            let canon_original = folded
                .original_node
                .canonicalize(&self.eg.uf)
                .unwrap_or_else(|_| unreachable!());
            self.eg.hashcons.insert(canon_original, repair_class);

            data.nodes.extend(folded.nodes);
            for (node, klass) in folded.parents {
                data.parents.entry(node).or_insert(klass);
            }
        }

        let mut new_parents = HashMap::new();
        for (node, klass) in data.parents {
            let stale_key = rewrites.get(&node).cloned().unwrap_or_else(|| node.clone());
            self.eg.hashcons.remove(&stale_key);

            let canon = node.canonicalize(&self.eg.uf).unwrap_or_else(|_| unreachable!());
            let klass = self.eg.uf.find(klass).unwrap_or_else(|_| unreachable!());

            let target = match new_parents.entry(canon.clone()) {
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    let prev = *entry.get();
                    if prev == klass {
                        prev
                    } else {
                        // Two parents canonicalized to the same e-node but
                        // live in different classes: a new congruence.
                        let union = self.merge(prev, klass).unwrap_or_else(|_| unreachable!());
                        let root = union.map_or(prev, |u| u.root);
                        entry.insert(root);
                        root
                    }
                },
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(klass);
                    klass
                },
            };

            self.eg.hashcons.insert(canon.clone(), target);
            rewrites.insert(node, canon);
        }
        data.parents = new_parents;

        data.nodes = data
            .nodes
            .drain()
            .map(|node| node.canonicalize(&self.eg.uf).unwrap_or_else(|_| unreachable!()))
            .collect();

        self.eg.classes.insert(repair_class, data);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn leaf(eg: &mut EGraph, op: &str) -> EClassId { eg.add(op, []).unwrap() }

    #[test]
    fn add_is_idempotent() {
        let mut eg = EGraph::new();
        let a1 = leaf(&mut eg, "a");
        let a2 = leaf(&mut eg, "a");
        assert_eq!(a1, a2);
        assert_eq!(eg.class_count(), 1);
        assert_eq!(eg.node_count(), 1);
    }

    #[test]
    fn structurally_distinct_nodes_get_distinct_classes() {
        let mut eg = EGraph::new();
        let a = leaf(&mut eg, "a");
        let b = leaf(&mut eg, "b");
        let fa = eg.add("f", [a]).unwrap();
        let fb = eg.add("f", [b]).unwrap();
        assert_ne!(fa, fb);
        assert_eq!(eg.class_count(), 4);
    }

    #[test]
    fn merge_drives_congruence_closure() {
        let mut eg = EGraph::new();
        let a = leaf(&mut eg, "a");
        let b = leaf(&mut eg, "b");
        let fa = eg.add("f", [a]).unwrap();
        let fb = eg.add("f", [b]).unwrap();

        {
            let mut w = eg.write();
            w.merge(a, b).unwrap();
        }

        // Merging a and b must transitively merge f(a) and f(b).
        assert_eq!(eg.find(fa).unwrap(), eg.find(fb).unwrap());
        assert_eq!(eg.class_count(), 2);
    }

    #[test]
    fn canonical_keys_invariant_holds_after_merge() {
        let mut eg = EGraph::new();
        let a = leaf(&mut eg, "a");
        let b = leaf(&mut eg, "b");
        let c = leaf(&mut eg, "c");
        eg.add("f", [a]).unwrap();
        eg.add("f", [b]).unwrap();
        eg.add("g", [a, c]).unwrap();

        {
            let mut w = eg.write();
            w.merge(a, b).unwrap();
            w.merge(b, c).unwrap();
        }

        for (node, &class) in &eg.hashcons {
            assert_eq!(eg.find(class).unwrap(), class, "hashcons value must be canonical");
            for &arg in node.args() {
                assert_eq!(eg.find(arg).unwrap(), arg, "hashcons key must be canonical");
            }
        }
        for &class in eg.classes.keys() {
            assert_eq!(eg.find(class).unwrap(), class, "classes key must be canonical");
        }
    }

    #[test]
    fn add_pattern_reuses_bound_vars() {
        let mut eg = EGraph::new();
        let a = leaf(&mut eg, "a");
        let mut subst = Subst::new();
        subst.insert(Rc::from("x"), a);

        let p = Pattern::node("f", vec![Pattern::var("x"), Pattern::var("x")]);
        let class = eg.add_pattern(&subst, &p);
        let nodes = eg.get_nodes(class).unwrap().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.iter().next().unwrap().args(), [a, a]);
    }

    #[test]
    #[should_panic(expected = "unbound pattern variable")]
    fn add_pattern_panics_on_unbound_variable() {
        let mut eg = EGraph::new();
        eg.add_pattern(&Subst::new(), &Pattern::var("x"));
    }
}
