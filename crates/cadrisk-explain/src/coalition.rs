//! Coalition plans for Kernel SHAP.
//!
//! A coalition is a mask over the `k` varying features: `true` means the
//! feature takes the explained row's value, `false` means it takes the
//! background row's value. The empty and full coalitions are never part of
//! a plan; they enter the regression as hard constraints instead.

use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

/// A coalition mask together with its regression weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Coalition {
    pub mask: Vec<bool>,
    pub weight: f64,
}

impl Coalition {
    pub fn size(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }
}

/// Shapley kernel weight of a coalition of `size` out of `k` features.
///
/// `(k − 1) / (C(k, size) · size · (k − size))`, undefined (infinite) for
/// the empty and full coalitions.
pub fn shapley_kernel(k: usize, size: usize) -> f64 {
    debug_assert!(size > 0 && size < k);
    let k_f = k as f64;
    let s_f = size as f64;
    (k_f - 1.0) / (binomial(k, size) * s_f * (k_f - s_f))
}

/// `C(n, r)` as a float; exact for the feature counts used here.
pub fn binomial(n: usize, r: usize) -> f64 {
    let r = r.min(n - r);
    (0..r).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Number of non-trivial coalitions over `k` features, saturating.
pub fn coalition_count(k: usize) -> usize {
    if k >= usize::BITS as usize {
        return usize::MAX;
    }
    (1usize << k).saturating_sub(2)
}

/// Every non-trivial coalition with its exact kernel weight.
///
/// Used when `coalition_count(k)` fits the budget; the regression then
/// recovers exact Shapley values.
pub fn enumerate(k: usize) -> Vec<Coalition> {
    (1..(1usize << k) - 1)
        .map(|bits| {
            let mask: Vec<bool> = (0..k).map(|j| bits & (1 << j) != 0).collect();
            let size = bits.count_ones() as usize;
            Coalition { mask, weight: shapley_kernel(k, size) }
        })
        .collect()
}

/// Draw about `budget` coalitions from the Shapley kernel distribution.
///
/// Sizes are drawn with probability proportional to the total kernel mass of
/// that size, members uniformly within the size, and every draw is paired
/// with its complement. Repeated masks are merged by summing their weights,
/// so each distinct mask is evaluated once.
pub fn sample(k: usize, budget: usize, rng: &mut StdRng) -> Vec<Coalition> {
    let sizes: Vec<usize> = (1..k).collect();
    // Total kernel mass of all coalitions of size s: (k-1) / (s (k-s)).
    let mass: Vec<f64> = sizes
        .iter()
        .map(|&s| (k as f64 - 1.0) / (s as f64 * (k - s) as f64))
        .collect();
    let size_dist = match WeightedIndex::new(&mass) {
        Ok(d) => d,
        // Only reachable for k < 2, where there is nothing to sample.
        Err(_) => return Vec::new(),
    };

    let pairs = (budget / 2).max(1);
    let mut counts: BTreeMap<Vec<bool>, f64> = BTreeMap::new();
    for _ in 0..pairs {
        let size = sizes[size_dist.sample(rng)];
        let mut mask = vec![false; k];
        for j in rand::seq::index::sample(rng, k, size).iter() {
            mask[j] = true;
        }
        let complement: Vec<bool> = mask.iter().map(|m| !m).collect();
        *counts.entry(mask).or_insert(0.0) += 1.0;
        *counts.entry(complement).or_insert(0.0) += 1.0;
    }

    counts
        .into_iter()
        .map(|(mask, weight)| Coalition { mask, weight })
        .collect()
}
