//! Number theory, graph construction and partition.

use modgraph::graph::Graph;
use modgraph::number_theory::{factors_of, next_of};
use modgraph::partition::compute_partition;
use modgraph::ModgraphError;

// ─────────────────────────────────────────────────────────────
//  Number theory
// ─────────────────────────────────────────────────────────────

#[test]
fn next_of_stays_in_range() {
    for m in 1..=64 {
        for i in 0..m {
            let n = next_of(i, m);
            assert!(n < m, "next_of({i}, {m}) = {n}");
            assert_eq!(n, (i * i) % m);
        }
    }
}

#[test]
fn next_of_large_modulus_does_not_overflow() {
    let m = usize::MAX - 1;
    let i = usize::MAX - 2; // ≡ −1 (mod m)
    assert_eq!(next_of(i, m), 1);
}

#[test]
fn factors_include_sentinel_but_not_one() {
    assert_eq!(factors_of(0), vec![0]);
    assert_eq!(factors_of(1), vec![0]);
    assert_eq!(factors_of(4), vec![0, 2]);
    assert_eq!(factors_of(7), vec![0]);
    assert_eq!(factors_of(12), vec![0, 2, 3, 4, 6]);
    assert_eq!(factors_of(30), vec![0, 2, 3, 5, 6, 10, 15]);
}

#[test]
fn factors_are_idempotent() {
    for m in 0..100 {
        assert_eq!(factors_of(m), factors_of(m));
    }
}

// ─────────────────────────────────────────────────────────────
//  Graph
// ─────────────────────────────────────────────────────────────

#[test]
fn negative_modulus_is_rejected() {
    match Graph::new(-3) {
        Err(ModgraphError::InvalidModulus(-3)) => {}
        other => panic!("expected InvalidModulus, got {other:?}"),
    }
}

#[test]
fn empty_graph_for_zero_modulus() {
    let g = Graph::new(0).unwrap();
    assert_eq!(g.size(), 0);
    assert_eq!(g.factors(), &[0]);
}

#[test]
fn modulus_ten_edges() {
    let g = Graph::new(10).unwrap();
    let next: Vec<usize> = (0..10).map(|i| g.next(i)).collect();
    assert_eq!(next, vec![0, 1, 4, 9, 6, 5, 6, 9, 4, 1]);

    assert_eq!(g.prev(0), &[0]);
    assert_eq!(g.prev(1), &[1, 9]);
    assert_eq!(g.prev(4), &[2, 8]);
    assert_eq!(g.prev(9), &[3, 7]);
    assert_eq!(g.prev(6), &[4, 6]);
    assert_eq!(g.prev(5), &[5]);
    for i in [2, 3, 7, 8] {
        assert!(g.prev(i).is_empty(), "node {i} is not a square mod 10");
    }

    let fixed: Vec<usize> = g.fixed_points().collect();
    assert_eq!(fixed, vec![0, 1, 5, 6]);
}

#[test]
fn prev_is_inverse_of_next() {
    for m in 1..=60usize {
        let g = Graph::with_modulus(m);
        let total: usize = (0..m).map(|k| g.prev(k).len()).sum();
        assert_eq!(total, m, "m = {m}");
        for i in 0..m {
            assert!(g.prev(g.next(i)).contains(&i));
            for &j in g.prev(i) {
                assert_eq!(g.next(j), i);
            }
        }
    }
}

#[test]
fn complement_index() {
    let g = Graph::new(10).unwrap();
    assert_eq!(g.complement(0), None);
    assert_eq!(g.complement(5), None);
    assert_eq!(g.complement(3), Some(7));
    assert_eq!(g.complement(9), Some(1));
    assert_eq!(g.complement(10), None);
}

#[test]
fn edges_are_symmetric_adjacency() {
    let g = Graph::new(10).unwrap();
    assert!(g.is_edge(2, 4));
    assert!(g.is_edge(4, 2));
    assert!(!g.is_edge(2, 3));
}

// ─────────────────────────────────────────────────────────────
//  Partition
// ─────────────────────────────────────────────────────────────

#[test]
fn partition_of_modulus_ten() {
    let g = Graph::new(10).unwrap();
    let p = compute_partition(&g).unwrap();

    let members: Vec<Vec<usize>> = p.subgraphs().iter().map(|s| s.members.clone()).collect();
    assert_eq!(
        members,
        vec![vec![0], vec![1, 3, 7, 9], vec![2, 4, 6, 8], vec![5]],
    );
    for (id, s) in p.subgraphs().iter().enumerate() {
        assert_eq!(s.id, id);
    }
    assert_eq!(p.subgraph_of(7), 1);
    assert_eq!(p.subgraph_of(8), 2);
}

#[test]
fn partition_is_total_disjoint_and_edge_closed() {
    for m in 1..=80usize {
        let g = Graph::with_modulus(m);
        let p = compute_partition(&g).unwrap();

        let mut seen = vec![0usize; m];
        for s in p.subgraphs() {
            assert!(!s.is_empty());
            for &n in &s.members {
                seen[n] += 1;
                assert_eq!(p.subgraph_of(n), s.id);
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "m = {m}: not a partition");

        for i in 0..m {
            assert_eq!(p.subgraph_of(i), p.subgraph_of(g.next(i)));
        }
    }
}

#[test]
fn partition_is_deterministic() {
    let g = Graph::new(97 * 3).unwrap();
    assert_eq!(compute_partition(&g).unwrap(), compute_partition(&g).unwrap());
}

#[test]
fn prime_modulus_has_two_fixed_components() {
    // For odd prime p, 0 and 1 are fixed points; 0 is isolated.
    let g = Graph::new(13).unwrap();
    let p = compute_partition(&g).unwrap();
    assert_eq!(p.subgraphs()[0].members, vec![0]);
    assert!(p.subgraphs()[1].contains(1));
    assert!(p.subgraphs()[1].contains(12));
}
