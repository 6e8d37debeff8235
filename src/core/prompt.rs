/// Prompt combination: every ordered arrangement of a game's trait phrases.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::schema::prompt::{Prompt, TraitPhrase};

/// Number of ordered arrangements of 1..=k items: the sum of k!/(k-r)!.
/// `None` on overflow.
pub fn arrangement_count(k: usize) -> Option<usize> {
    let mut total = 0usize;
    let mut falling = 1usize;
    for r in 0..k {
        falling = falling.checked_mul(k - r)?;
        total = total.checked_add(falling)?;
    }
    Some(total)
}

/// Every r-permutation of `items` for r = 1..=len, shortest first.
pub fn arrangements<T>(items: &[T]) -> Vec<Vec<&T>> {
    let mut out = Vec::with_capacity(arrangement_count(items.len()).unwrap_or(0).min(1 << 16));
    let mut used = vec![false; items.len()];
    for r in 1..=items.len() {
        let mut current = Vec::with_capacity(r);
        arrange(items, r, &mut used, &mut current, &mut out);
    }
    out
}

fn arrange<'a, T>(
    items: &'a [T],
    r: usize,
    used: &mut [bool],
    current: &mut Vec<&'a T>,
    out: &mut Vec<Vec<&'a T>>,
) {
    if current.len() == r {
        out.push(current.clone());
        return;
    }
    for i in 0..items.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(&items[i]);
        arrange(items, r, used, current, out);
        current.pop();
        used[i] = false;
    }
}

/// All prompts that can be built from `phrases`, shortest first.
pub fn prompts(phrases: &[TraitPhrase]) -> Vec<Prompt> {
    arrangements(phrases)
        .into_iter()
        .map(|arrangement| Prompt::new(arrangement.into_iter().cloned().collect()))
        .collect()
}

/// Rendered form of [`prompts`].
pub fn render_prompts(phrases: &[TraitPhrase], suffix: &str) -> Vec<String> {
    prompts(phrases).iter().map(|p| p.render(suffix)).collect()
}

/// Up to `cap` distinct prompts drawn at random: a length in 1..=k, then
/// a random arrangement of that length.
///
/// Used when the full arrangement set would be too large to build.
pub fn sample_prompts(phrases: &[TraitPhrase], cap: usize, rng: &mut StdRng) -> Vec<Prompt> {
    if phrases.is_empty() {
        return Vec::new();
    }
    let max_attempts = cap.saturating_mul(16).max(16);
    let mut seen: FxHashSet<Vec<usize>> = FxHashSet::default();
    let mut out = Vec::with_capacity(cap);
    let mut attempts = 0;

    while out.len() < cap && attempts < max_attempts {
        attempts += 1;
        let r = rng.gen_range(1..=phrases.len());
        let mut indices: Vec<usize> = (0..phrases.len()).collect();
        indices.shuffle(rng);
        indices.truncate(r);
        if seen.insert(indices.clone()) {
            out.push(Prompt::new(indices.iter().map(|&i| phrases[i].clone()).collect()));
        }
    }
    out
}
