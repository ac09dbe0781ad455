//! Fixed-example entry point: builds one term and one rewrite set, runs
//! saturation, and prints the result. Takes no arguments.

use anyhow::Context as _;
use eqsat_core::{
    saturate::{saturate, DEFAULT_MAX_ITER},
    term::Rewrite,
};
use tracing_subscriber::layer::SubscriberExt as _;

fn init_tracing() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
                .context("building default EnvFilter")?,
        )
        .with(tracing_subscriber::fmt::layer());

    tracing::subscriber::set_global_default(subscriber).context("installing tracing subscriber")
}

fn rule(name: &str, lhs: &str, rhs: &str) -> anyhow::Result<Rewrite> {
    let lhs = eqsat_syntax::parse_pattern(lhs).with_context(|| format!("parsing lhs of rule `{name}`"))?;
    let rhs = eqsat_syntax::parse_pattern(rhs).with_context(|| format!("parsing rhs of rule `{name}`"))?;
    let rw = Rewrite::new(name, lhs, rhs);
    anyhow::ensure!(rw.well_formed(), "rule `{name}` uses a right-hand-side variable not bound by its left-hand side");
    Ok(rw)
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    // `(/ (* a 2) 2)` simplified by four arithmetic-identity rewrites: should
    // reduce to `a` via `(* a (/ 2 2)) = (* a 1) = a`.
    let term = eqsat_syntax::parse_term("(/ (* a 2) 2)").context("parsing fixed example term")?;

    let rewrites = [
        rule("double-as-shift", "(* ?x 2)", "(<< ?x 1)")?,
        rule("div-distrib", "(/ (* ?x ?y) ?z)", "(* ?x (/ ?y ?z))")?,
        rule("self-div", "(/ ?x ?x)", "1")?,
        rule("mul-one", "(* ?x 1)", "?x")?,
    ];

    let report = saturate(&term, &rewrites, DEFAULT_MAX_ITER);

    println!("input:      {}", eqsat_syntax::print_term(&term));
    println!("extracted:  {}", eqsat_syntax::print_term(&report.term));
    println!("size:       {}", report.size);
    println!(
        "iterations: {} ({})",
        report.iterations,
        if report.converged { "converged" } else { "hit iteration cap" }
    );
    println!("classes:    {}", report.class_count);
    println!("nodes:      {}", report.node_count);

    Ok(())
}
