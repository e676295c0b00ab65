use super::{ProbabilityError, choose};

fn check_p(function: &'static str, p: f64) -> Result<(), ProbabilityError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ProbabilityError::domain(
            function,
            format!("p = {p} is outside [0, 1]"),
        ));
    }
    Ok(())
}

/// `Pr(X = k)` for `X ~ Binomial(n, p)`.
pub fn binomial_pmf(k: u32, n: u32, p: f64) -> Result<f64, ProbabilityError> {
    if k > n {
        return Err(ProbabilityError::domain(
            "binomial_pmf",
            format!("k = {k} exceeds n = {n}"),
        ));
    }
    check_p("binomial_pmf", p)?;
    Ok(choose(n, k) as f64 * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32))
}

/// `Pr(X <= k)`. Counts above `n` carry no mass, so `k` is capped at `n`.
pub fn binomial_cdf(k: u32, n: u32, p: f64) -> Result<f64, ProbabilityError> {
    check_p("binomial_cdf", p)?;
    let mut total = 0.0;
    for i in 0..=k.min(n) {
        total += binomial_pmf(i, n, p)?;
    }
    Ok(total.min(1.0))
}

/// `Pr(X >= k)`.
pub fn binomial_tail(k: u32, n: u32, p: f64) -> Result<f64, ProbabilityError> {
    if k == 0 {
        check_p("binomial_tail", p)?;
        return Ok(1.0);
    }
    Ok((1.0 - binomial_cdf(k - 1, n, p)?).max(0.0))
}

/// Probability that at least `k` of `n` fair `f`-sided dice show a given face,
/// knowing the true count lies within `[kmin, kmax]`.
pub fn conditional_face_probability(
    k: u32,
    kmin: u32,
    kmax: u32,
    n: u32,
    f: u8,
) -> Result<f64, ProbabilityError> {
    if f == 0 {
        return Err(ProbabilityError::domain(
            "conditional_face_probability",
            "dice need at least one face",
        ));
    }
    if k <= kmin {
        return Ok(1.0);
    }
    if k > kmax {
        return Ok(0.0);
    }

    let p = 1.0 / f64::from(f);
    let above_range = binomial_tail(kmax + 1, n, p)?;
    let prior = binomial_tail(kmin, n, p)? - above_range;
    if prior <= 0.0 {
        return Ok(0.0);
    }
    let hit = binomial_tail(k, n, p)? - above_range;
    Ok((hit / prior).clamp(0.0, 1.0))
}
