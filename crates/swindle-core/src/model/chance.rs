//! Injectable randomness.
//!
//! Every random decision in the game goes through [`Chance`], so a session can
//! be replayed from a seed (any [`rand::Rng`]) or driven draw-by-draw from a
//! fixed script in tests ([`ScriptedChance`]).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

pub trait Chance {
    /// Uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// Uniform integer in `low..=high`.
    fn between(&mut self, low: u32, high: u32) -> u32;
}

impl<R: Rng + ?Sized> Chance for R {
    fn unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.gen_range(0..len.max(1))
    }

    fn between(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.gen_range(low..=high)
    }
}

/// Replays queued unit draws, then falls back to a seeded generator.
///
/// `index` and `between` consume one unit draw each and map it onto the
/// requested range, so a script is simply the sequence of `unit` values the
/// caller wants every draw to see.
#[derive(Debug, Clone)]
pub struct ScriptedChance {
    script: VecDeque<f64>,
    fallback: SmallRng,
    drawn: usize,
}

impl ScriptedChance {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::with_fallback_seed(script, 0)
    }

    pub fn with_fallback_seed<I>(script: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            script: script.into_iter().collect(),
            fallback: SmallRng::seed_from_u64(seed),
            drawn: 0,
        }
    }

    /// Number of draws taken so far, scripted or not.
    pub fn drawn(&self) -> usize {
        self.drawn
    }

    /// Draws still queued in the script.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Chance for ScriptedChance {
    fn unit(&mut self) -> f64 {
        self.drawn += 1;
        match self.script.pop_front() {
            Some(value) => value.clamp(0.0, 1.0 - f64::EPSILON),
            None => self.fallback.r#gen::<f64>(),
        }
    }

    fn index(&mut self, len: usize) -> usize {
        let len = len.max(1);
        ((self.unit() * len as f64) as usize).min(len - 1)
    }

    fn between(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            self.unit();
            return low;
        }
        let span = (high - low + 1) as f64;
        low + ((self.unit() * span) as u32).min(high - low)
    }
}
