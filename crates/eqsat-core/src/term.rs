//! Ground terms and patterns: the trees that enter and leave the e-graph.

use std::{fmt, rc::Rc};

use hashbrown::HashMap;

use crate::union_find::EClassId;

/// An interned operator symbol, cheap to clone and compare.
pub type Symbol = Rc<str>;

/// A binding from pattern variable to e-class, produced by `ematch` and
/// consumed by `add_pattern`.
pub type Subst = HashMap<Symbol, EClassId>;

/// A ground tree with no free variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub op: Symbol,
    pub children: Vec<Term>,
}

impl Term {
    #[must_use]
    pub fn leaf(op: impl Into<Symbol>) -> Self {
        Self {
            op: op.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn node(op: impl Into<Symbol>, children: Vec<Term>) -> Self {
        Self {
            op: op.into(),
            children,
        }
    }

    /// Number of nodes in this term, counting itself.
    #[must_use]
    pub fn size(&self) -> usize {
        self.children
            .iter()
            .map(Term::size)
            .fold(1, usize::saturating_add)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write_sexpr(f, &self.op, &self.children) }
}

/// A tree whose leaves may be variables, to be matched or instantiated
/// against an e-graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    Var(Symbol),
    Node(Symbol, Vec<Pattern>),
}

impl Pattern {
    #[must_use]
    pub fn var(name: impl Into<Symbol>) -> Self { Self::Var(name.into()) }

    #[must_use]
    pub fn node(op: impl Into<Symbol>, children: Vec<Pattern>) -> Self {
        Self::Node(op.into(), children)
    }

    /// The variables occurring in this pattern, each listed once in
    /// first-occurrence order.
    #[must_use]
    pub fn vars(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<Symbol>) {
        match self {
            Self::Var(v) => {
                if !out.contains(v) {
                    out.push(Rc::clone(v));
                }
            },
            Self::Node(_, children) => children.iter().for_each(|c| c.collect_vars(out)),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(v) => write!(f, "?{v}"),
            Self::Node(op, children) => write_sexpr(f, op, children),
        }
    }
}

fn write_sexpr<T: fmt::Display>(f: &mut fmt::Formatter<'_>, op: &str, children: &[T]) -> fmt::Result {
    if children.is_empty() {
        return write!(f, "{op}");
    }

    write!(f, "({op}")?;
    for child in children {
        write!(f, " {child}")?;
    }
    write!(f, ")")
}

/// A named rewrite rule: rewrite any instance of `lhs` to the matching
/// instantiation of `rhs`.
///
/// # Panics
/// Nothing in this type itself panics, but [`crate::egraph::EGraph::add_pattern`]
/// will panic if `rhs` uses a variable not bound by the match against `lhs`;
/// this is a precondition on rule construction, checked by
/// [`Rewrite::well_formed`].
#[derive(Debug, Clone)]
pub struct Rewrite {
    pub name: Rc<str>,
    pub lhs: Pattern,
    pub rhs: Pattern,
}

impl Rewrite {
    #[must_use]
    pub fn new(name: impl Into<Rc<str>>, lhs: Pattern, rhs: Pattern) -> Self {
        Self {
            name: name.into(),
            lhs,
            rhs,
        }
    }

    /// `true` if every variable in `rhs` also occurs in `lhs`.
    #[must_use]
    pub fn well_formed(&self) -> bool {
        let bound = self.lhs.vars();
        self.rhs.vars().iter().all(|v| bound.contains(v))
    }
}

impl fmt::Display for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.lhs, self.rhs)
    }
}
