use super::{ProbabilityError, choose, factorial};
use std::collections::HashMap;

/// Largest item count the exact counter accepts; `20!` still fits in `u128`
/// with room for the multinomial products.
pub const MAX_ITEMS: u32 = 20;

/// Exact counts of how `n` labelled items spread over `d` labelled categories.
///
/// Results are memoised on `(k, n, d)`; a counter is meant to live for one
/// probability query.
#[derive(Debug, Default)]
pub struct CategoryCounter {
    exact: HashMap<(u32, u32, u32), u128>,
}

impl CategoryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoised `(k, n, d)` entries.
    pub fn cached(&self) -> usize {
        self.exact.len()
    }

    /// Assignments whose fullest category holds exactly `k` items.
    pub fn max_exactly(&mut self, k: u32, n: u32, d: u32) -> u128 {
        if n == 0 {
            return u128::from(k == 0);
        }
        if k == 0 || d == 0 || k > n {
            return 0;
        }
        if let Some(&hit) = self.exact.get(&(k, n, d)) {
            return hit;
        }

        // Pick the `i` categories that reach exactly `k`, deal them their
        // items, then spread the rest over the other categories below `k`.
        let mut total = 0u128;
        for i in 1..=(n / k).min(d) {
            let rest = n - i * k;
            let deal = factorial(n) / (factorial(k).pow(i) * factorial(rest));
            total += choose(d, i) * deal * self.all_below(k, rest, d - i);
        }

        self.exact.insert((k, n, d), total);
        total
    }

    /// Assignments where every category holds fewer than `k` items.
    pub fn all_below(&mut self, k: u32, n: u32, d: u32) -> u128 {
        (0..k).map(|j| self.max_exactly(j, n, d)).sum()
    }
}

fn check_args(function: &'static str, k: u32, n: u32, d: u32) -> Result<(), ProbabilityError> {
    if k > n {
        return Err(ProbabilityError::domain(
            function,
            format!("k = {k} exceeds n = {n}"),
        ));
    }
    if n > MAX_ITEMS {
        return Err(ProbabilityError::domain(
            function,
            format!("n = {n} exceeds the supported maximum of {MAX_ITEMS}"),
        ));
    }
    if d == 0 && n > 0 {
        return Err(ProbabilityError::domain(
            function,
            "items need at least one category",
        ));
    }
    if u128::from(d).checked_pow(n).is_none() {
        return Err(ProbabilityError::domain(
            function,
            format!("{d}^{n} outcomes overflow the exact counter"),
        ));
    }
    Ok(())
}

/// Probability that no category among `d` receives `k` or more of `n` items.
pub fn probability_no_category_reaches(k: u32, n: u32, d: u32) -> Result<f64, ProbabilityError> {
    check_args("probability_no_category_reaches", k, n, d)?;
    let mut counter = CategoryCounter::new();
    let favourable = counter.all_below(k, n, d);
    let outcomes = u128::from(d).pow(n);
    Ok(favourable as f64 / outcomes as f64)
}

/// Probability that some category among `d` receives at least `k` of `n` items.
pub fn probability_at_least_k_same(k: u32, n: u32, d: u32) -> Result<f64, ProbabilityError> {
    check_args("probability_at_least_k_same", k, n, d)?;
    if d == 0 || k <= n.div_ceil(d) {
        return Ok(1.0);
    }
    Ok(1.0 - probability_no_category_reaches(k, n, d)?)
}
