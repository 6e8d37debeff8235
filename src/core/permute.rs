/// Row permutation: full ordering enumeration and capped random sampling.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;

/// `n!`, or `None` if it does not fit in a `usize`.
pub fn factorial(n: usize) -> Option<usize> {
    (2..=n).try_fold(1usize, |acc, k| acc.checked_mul(k))
}

/// Every ordering of `rows`, in lexicographic order of their original
/// positions.
///
/// Orderings are taken over positions, so equal rows still produce `n!`
/// results. An empty input has exactly one (empty) ordering.
pub fn all_orderings<T: Clone>(rows: &[T]) -> Vec<Vec<T>> {
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    let mut orderings = Vec::with_capacity(factorial(rows.len()).unwrap_or(0).min(1 << 16));
    loop {
        orderings.push(indices.iter().map(|&i| rows[i].clone()).collect());
        if !next_permutation(&mut indices) {
            break;
        }
    }
    orderings
}

/// Advance `v` to the next lexicographic permutation. Returns `false`
/// once `v` is the last one.
fn next_permutation(v: &mut [usize]) -> bool {
    if v.len() < 2 {
        return false;
    }
    let mut i = v.len() - 1;
    while i > 0 && v[i - 1] >= v[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = v.len() - 1;
    while v[j] <= v[i - 1] {
        j -= 1;
    }
    v.swap(i - 1, j);
    v[i..].reverse();
    true
}

/// A random sample of at most `cap` distinct orderings of `rows`.
///
/// When `n!` is within `exhaustive_limit` every ordering is generated,
/// shuffled, and truncated to `cap`. Past the limit, orderings are drawn
/// at random instead so the pool stays bounded. Either way the result
/// depends only on `rng`.
pub fn sample_orderings<T: Clone>(
    rows: &[T],
    cap: usize,
    exhaustive_limit: usize,
    rng: &mut StdRng,
) -> Vec<Vec<T>> {
    match factorial(rows.len()) {
        Some(total) if total <= exhaustive_limit => {
            let mut orderings = all_orderings(rows);
            orderings.shuffle(rng);
            orderings.truncate(cap);
            orderings
        }
        _ => random_orderings(rows, cap, rng),
    }
}

fn random_orderings<T: Clone>(rows: &[T], cap: usize, rng: &mut StdRng) -> Vec<Vec<T>> {
    let max_attempts = cap.saturating_mul(16).max(16);
    let mut seen: FxHashSet<Vec<usize>> = FxHashSet::default();
    let mut orderings = Vec::with_capacity(cap);
    let mut attempts = 0;

    while orderings.len() < cap && attempts < max_attempts {
        attempts += 1;
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        indices.shuffle(rng);
        if seen.insert(indices.clone()) {
            orderings.push(indices.iter().map(|&i| rows[i].clone()).collect());
        }
    }
    orderings
}

/// Reorder the operand sprites of an interaction row.
///
/// `"    movable wall > stepBack"` may become `"    wall movable > stepBack"`.
/// Indentation and everything from the `>` onward are kept; rows without
/// `>` or with fewer than two operands come back unchanged.
pub fn shuffle_operands(row: &str, rng: &mut StdRng) -> String {
    let Some(arrow) = row.find('>') else {
        return row.to_string();
    };
    let (lhs, rhs) = row.split_at(arrow);
    let mut operands: Vec<&str> = lhs.split_whitespace().collect();
    if operands.len() < 2 {
        return row.to_string();
    }
    let indent = &lhs[..lhs.len() - lhs.trim_start().len()];
    operands.shuffle(rng);
    format!("{}{} {}", indent, operands.join(" "), rhs)
}
