//! Modular arithmetic behind the graph of squares.

/// Node reached from `i` by squaring modulo `m`.
///
/// Computed in `u128` so that `i * i` cannot overflow for any `usize` modulus.
/// Callers guarantee `m > 0` (a graph with `m == 0` has no nodes to ask about).
#[inline]
pub fn next_of(i: usize, m: usize) -> usize {
    ((i as u128 * i as u128) % m as u128) as usize
}

/// Factors of `m` that drive the sum- and factor-attraction terms.
///
/// Returns `[0, f_1, f_2, ...]` where `0` stands for `m` itself (its residue)
/// and the `f_k` are the divisors of `m` with `2 <= f_k <= m / 2`, ascending.
/// `1` is never a member.
pub fn factors_of(m: usize) -> Vec<usize> {
    let mut factors = vec![0];
    factors.extend((2..=m / 2).filter(|&f| m % f == 0));
    factors
}
