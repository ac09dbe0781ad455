//! The equality-saturation driver: repeatedly apply rewrites to a fresh
//! e-graph until neither its class count nor node count changes, or an
//! iteration budget is exhausted, then extract the smallest witness.

use crate::{
    egraph::EGraph,
    term::{Rewrite, Term},
};

/// Default iteration cap, per the driver's safety-cap role: a rule like
/// `x = x + 0` would otherwise never reach a fixed point.
pub const DEFAULT_MAX_ITER: usize = 16;

/// The outcome of a [`saturate`] run.
#[derive(Debug, Clone)]
pub struct SaturationReport {
    /// The extracted smallest term equivalent to the input.
    pub term: Term,
    /// That term's node count.
    pub size: usize,
    /// Number of sweeps actually run (may be less than `max_iter` if a
    /// fixed point was reached early).
    pub iterations: usize,
    /// Whether the fixed point was reached before `max_iter` sweeps.
    pub converged: bool,
    /// Final e-class count.
    pub class_count: usize,
    /// Final e-node count.
    pub node_count: usize,
}

/// Run equality saturation on `term` under `rewrites`, for at most
/// `max_iter` sweeps, and return the smallest equivalent term found.
#[must_use]
pub fn saturate(term: &Term, rewrites: &[Rewrite], max_iter: usize) -> SaturationReport {
    let mut eg = EGraph::new();
    let root = eg.add_term(term).unwrap_or_else(|_| unreachable!());

    let mut iterations = 0;
    let mut converged = false;

    for i in 0..max_iter {
        let _span = tracing::debug_span!("sweep", i).entered();
        iterations = i + 1;

        let before = (eg.class_count(), eg.node_count());

        for rule in rewrites {
            let matches = eg.ematch(&rule.lhs);
            tracing::trace!(rule = %rule.name, matches = matches.len());

            let mut w = eg.write();
            for (subst, class) in matches {
                let instantiated = w.add_pattern(&subst, &rule.rhs);
                w.merge(class, instantiated).unwrap_or_else(|_| unreachable!());
            }
        }

        let after = (eg.class_count(), eg.node_count());
        if after == before {
            converged = true;
            break;
        }
    }

    let (term, size) = eg.extract_smallest(root).unwrap_or_else(|| {
        unreachable!("the root class was reached from add_term of a ground term, so it has an acyclic witness")
    });

    tracing::info!(%term, size, iterations, converged, "saturation finished");

    SaturationReport {
        term,
        size,
        iterations,
        converged,
        class_count: eg.class_count(),
        node_count: eg.node_count(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::term::Pattern;

    fn rule(name: &str, lhs: Pattern, rhs: Pattern) -> Rewrite { Rewrite::new(name, lhs, rhs) }

    #[test]
    fn no_rewrites_returns_input_unchanged() {
        let t = Term::leaf("a");
        let report = saturate(&t, &[], DEFAULT_MAX_ITER);
        assert_eq!(report.term, t);
        assert_eq!(report.size, 1);
        assert!(report.converged);
    }

    #[test]
    fn commutativity_preserves_size() {
        let t = Term::node("+", vec![Term::leaf("a"), Term::leaf("b")]);
        let rules = [rule(
            "comm",
            Pattern::node("+", vec![Pattern::var("x"), Pattern::var("y")]),
            Pattern::node("+", vec![Pattern::var("y"), Pattern::var("x")]),
        )];

        let report = saturate(&t, &rules, 4);
        assert_eq!(report.size, 3);
        assert!(matches!(report.term.op.as_ref(), "+"));
    }

    #[test]
    fn arithmetic_simplification_chain() {
        let t = Term::node("/", vec![Term::node("*", vec![Term::leaf("a"), Term::leaf("2")]), Term::leaf("2")]);

        let rules = [
            rule(
                "double-as-shift",
                Pattern::node("*", vec![Pattern::var("x"), Pattern::node("2", vec![])]),
                Pattern::node("<<", vec![Pattern::var("x"), Pattern::node("1", vec![])]),
            ),
            rule(
                "div-distrib",
                Pattern::node(
                    "/",
                    vec![Pattern::node("*", vec![Pattern::var("x"), Pattern::var("y")]), Pattern::var("z")],
                ),
                Pattern::node("*", vec![Pattern::var("x"), Pattern::node("/", vec![Pattern::var("y"), Pattern::var("z")])]),
            ),
            rule(
                "self-div",
                Pattern::node("/", vec![Pattern::var("x"), Pattern::var("x")]),
                Pattern::node("1", vec![]),
            ),
            rule(
                "mul-one",
                Pattern::node("*", vec![Pattern::var("x"), Pattern::node("1", vec![])]),
                Pattern::var("x"),
            ),
        ];

        let report = saturate(&t, &rules, DEFAULT_MAX_ITER);
        assert_eq!(report.term, Term::leaf("a"));
    }

    #[test]
    fn zero_times_anything_plus_y_reduces_to_y() {
        let t = Term::node("+", vec![Term::node("*", vec![Term::leaf("0"), Term::leaf("x")]), Term::leaf("y")]);

        let rules = [
            rule(
                "mul-zero",
                Pattern::node("*", vec![Pattern::node("0", vec![]), Pattern::var("x")]),
                Pattern::node("0", vec![]),
            ),
            rule(
                "add-zero",
                Pattern::node("+", vec![Pattern::node("0", vec![]), Pattern::var("x")]),
                Pattern::var("x"),
            ),
        ];

        let report = saturate(&t, &rules, DEFAULT_MAX_ITER);
        assert_eq!(report.term, Term::leaf("y"));
    }

    #[test]
    fn idempotent_rewrite_converges_in_one_sweep() {
        let t = Term::node("f", vec![Term::node("g", vec![Term::leaf("x")])]);
        let rules = [rule(
            "g-idempotent",
            Pattern::node("g", vec![Pattern::var("x")]),
            Pattern::node("g", vec![Pattern::var("x")]),
        )];

        let report = saturate(&t, &rules, DEFAULT_MAX_ITER);
        assert_eq!(report.term, t);
        assert_eq!(report.iterations, 1);
        assert!(report.converged);
    }

    #[test]
    fn self_addition_becomes_doubling() {
        let t = Term::node("+", vec![Term::leaf("a"), Term::leaf("a")]);
        let rules = [rule(
            "double",
            Pattern::node("+", vec![Pattern::var("x"), Pattern::var("x")]),
            Pattern::node("*", vec![Pattern::node("2", vec![]), Pattern::var("x")]),
        )];

        let report = saturate(&t, &rules, DEFAULT_MAX_ITER);
        assert_eq!(report.size, 3);
    }
}
