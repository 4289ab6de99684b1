//! Release-mode benchmarks for the layout pipeline.
//!
//! Run with:   cargo test --release --test bench_release -- --nocapture
//!
//! Timings use `std::time::Instant` and are printed, not asserted.

use modgraph::graph::Graph;
use modgraph::layout::{initial_positions, Layout};
use modgraph::partition::compute_partition;
use modgraph::potential::PotentialModel;
use modgraph::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

// ─────────────────────────────────────────────────────────────
//  Helpers
// ─────────────────────────────────────────────────────────────

const MODULI: &[usize] = &[10, 50, 100, 200, 400];

fn fmt_count(n: usize) -> String {
    if n >= 1_000_000 { format!("{:.2}M", n as f64 / 1e6) }
    else if n >= 1_000 { format!("{:.1}k", n as f64 / 1e3) }
    else { format!("{}", n) }
}

fn fmt_time(us: f64) -> String {
    if us >= 1_000_000.0 { format!("{:.2} s",  us / 1e6) }
    else if us >= 1_000.0 { format!("{:.2} ms", us / 1e3) }
    else { format!("{:.1} μs", us) }
}

// ─────────────────────────────────────────────────────────────
//  Benchmarks
// ─────────────────────────────────────────────────────────────

#[test]
fn bench_force_sweep_scaling() {
    eprintln!("\n┌─────────────────────────────────────────────────────────────────┐");
    eprintln!("│              FORCE SWEEP  (all pairs, potential + net)          │");
    eprintln!("├──────────┬──────────┬───────────┬───────────────────────────────┤");
    eprintln!("│  m       │  pairs   │  per-eval │  total (iters)                │");
    eprintln!("├──────────┼──────────┼───────────┼───────────────────────────────┤");

    for &m in MODULI {
        let g = Graph::with_modulus(m);
        let model = PotentialModel::new(&g, PotentialScales::default());
        let mut rng = StdRng::seed_from_u64(m as u64);
        let pos = initial_positions(m, InitialSpread::SqrtModulus, &mut rng);

        // Warm-up
        let _ = model.evaluate(&pos);

        let pairs = m * (m - 1) / 2;
        let iters: usize = if pairs < 1_000 { 2000 }
            else if pairs < 10_000 { 200 }
            else { 20 };

        let start = Instant::now();
        let mut acc = 0.0;
        for _ in 0..iters {
            acc += model.evaluate(&pos).potential;
        }
        let elapsed = start.elapsed();
        assert!(acc.is_finite());
        let per_us = elapsed.as_micros() as f64 / iters as f64;

        eprintln!(
            "│  {:<7} │ {:>8} │ {:>9} │  {:.2} ms  ({} iters){}│",
            m,
            fmt_count(pairs),
            fmt_time(per_us),
            elapsed.as_secs_f64() * 1000.0,
            iters,
            " ".repeat(4usize.saturating_sub(format!("{}", iters).len())),
        );
    }
    eprintln!("└──────────┴──────────┴───────────┴───────────────────────────────┘\n");
}

#[test]
fn bench_partition_scaling() {
    eprintln!("\n┌─────────────────────────────────────────────────────────────────┐");
    eprintln!("│              GRAPH + PARTITION                                  │");
    eprintln!("├──────────┬──────────┬───────────┬───────────────────────────────┤");
    eprintln!("│  m       │  comps   │  per-run  │  total (iters)                │");
    eprintln!("├──────────┼──────────┼───────────┼───────────────────────────────┤");

    for &m in &[1_000usize, 10_000, 100_000] {
        let iters: usize = if m < 10_000 { 200 } else { 10 };
        let start = Instant::now();
        let mut comps = 0;
        for _ in 0..iters {
            let g = Graph::with_modulus(m);
            comps = compute_partition(&g).unwrap().len();
        }
        let elapsed = start.elapsed();
        let per_us = elapsed.as_micros() as f64 / iters as f64;

        eprintln!(
            "│  {:<7} │ {:>8} │ {:>9} │  {:.2} ms  ({} iters){}│",
            fmt_count(m),
            comps,
            fmt_time(per_us),
            elapsed.as_secs_f64() * 1000.0,
            iters,
            " ".repeat(4usize.saturating_sub(format!("{}", iters).len())),
        );
    }
    eprintln!("└──────────┴──────────┴───────────┴───────────────────────────────┘\n");
}

#[test]
fn bench_full_layout() {
    eprintln!("\n┌─────────────────────────────────────────────────────────────────┐");
    eprintln!("│              FULL L-BFGS LAYOUT  (≤2000 iters)                  │");
    eprintln!("├──────────┬──────────┬───────────┬───────────────────────────────┤");
    eprintln!("│  m       │  evals   │  per-run  │  termination                  │");
    eprintln!("├──────────┼──────────┼───────────┼───────────────────────────────┤");

    for &m in &[10usize, 20, 40] {
        let config = LayoutConfig {
            solver: SolverOptions {
                max_iterations: 2_000,
                ..SolverOptions::default()
            },
            seed: Some(m as u64),
            ..LayoutConfig::default()
        };

        let start = Instant::now();
        let layout = Layout::compute(m as i64, &config).unwrap();
        let elapsed = start.elapsed();

        let status = format!("{:?}", layout.result().termination);
        eprintln!(
            "│  {:<7} │ {:>8} │ {:>9} │  {:<29}│",
            m,
            fmt_count(layout.result().evaluations as usize),
            fmt_time(elapsed.as_micros() as f64),
            status,
        );
    }
    eprintln!("└──────────┴──────────┴───────────┴───────────────────────────────┘\n");
}
