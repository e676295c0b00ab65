//! Closed-form and counting probabilities used by the opponent.
//!
//! - `binomial`: PMF/CDF/tail of `Binomial(n, p)` and the conditional
//!   probability that a face reaches a count given a known count range.
//! - `categories`: the chance that, among `n` dice of `d` faces, some face
//!   shows up at least `k` times, counted exactly with memoised recursion.

mod binomial;
mod categories;

pub use binomial::{binomial_cdf, binomial_pmf, binomial_tail, conditional_face_probability};
pub use categories::{
    CategoryCounter, MAX_ITEMS, probability_at_least_k_same, probability_no_category_reaches,
};

/// Invalid arguments handed to a probability routine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbabilityError {
    #[error("{function}: {message}")]
    Domain {
        function: &'static str,
        message: String,
    },
}

impl ProbabilityError {
    pub(crate) fn domain(function: &'static str, message: impl Into<String>) -> Self {
        ProbabilityError::Domain {
            function,
            message: message.into(),
        }
    }
}

/// Exact binomial coefficient.
pub(crate) fn choose(n: u32, k: u32) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u128, |acc, i| acc * u128::from(n - i) / u128::from(i + 1))
}

pub(crate) fn factorial(n: u32) -> u128 {
    (1..=u128::from(n)).product()
}

#[cfg(test)]
mod tests {
    use super::{choose, factorial};

    #[test]
    fn choose_matches_pascal() {
        assert_eq!(choose(5, 0), 1);
        assert_eq!(choose(5, 2), 10);
        assert_eq!(choose(10, 5), 252);
        assert_eq!(choose(3, 4), 0);
    }

    #[test]
    fn factorial_small_values() {
        assert_eq!(factorial(0), 1);
        assert_eq!(factorial(5), 120);
        assert_eq!(factorial(20), 2_432_902_008_176_640_000);
    }
}
