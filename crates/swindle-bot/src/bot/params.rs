/// Count weights for the opening bid, indexed by how many of the chosen face
/// the engine holds. Row `h` has one weight per count `1..=h`.
const DEFAULT_STRATEGY_TABLE: [&[u32]; 5] = [
    &[1],
    &[5, 5],
    &[1, 3, 6],
    &[1, 1, 2, 6],
    &[0, 1, 1, 2, 6],
];

/// Tunable knobs of the reasoning engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    strategy_table: Vec<Vec<u32>>,
    bluff_chance: f64,
    suspicion_per_die: f64,
    confidence_floor: f64,
    fresh_face_pool: u32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            strategy_table: DEFAULT_STRATEGY_TABLE
                .iter()
                .map(|row| row.to_vec())
                .collect(),
            bluff_chance: 0.5,
            suspicion_per_die: 0.15,
            confidence_floor: 0.1,
            fresh_face_pool: 5,
        }
    }
}

impl EngineParams {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut probability = |key: &str, fallback: f64| {
            read(key)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite() && (0.0..=1.0).contains(value))
                .unwrap_or(fallback)
        };

        let bluff_chance = probability("SWINDLE_BLUFF_CHANCE", defaults.bluff_chance);
        let suspicion_per_die =
            probability("SWINDLE_SUSPICION_PER_DIE", defaults.suspicion_per_die);
        let confidence_floor = probability("SWINDLE_CONFIDENCE_FLOOR", defaults.confidence_floor);

        Self {
            bluff_chance,
            suspicion_per_die,
            confidence_floor,
            ..defaults
        }
    }

    pub fn bluff_chance(&self) -> f64 {
        self.bluff_chance
    }

    pub fn suspicion_per_die(&self) -> f64 {
        self.suspicion_per_die
    }

    pub fn confidence_floor(&self) -> f64 {
        self.confidence_floor
    }

    /// Rival pool size at which a fresh-face bid stops being scaled up.
    pub fn fresh_face_pool(&self) -> u32 {
        self.fresh_face_pool
    }

    /// Weights for holding `held` of a face; holdings past the last row use it.
    pub fn strategy_row(&self, held: usize) -> &[u32] {
        let last = self.strategy_table.len().saturating_sub(1);
        let idx = held.saturating_sub(1).min(last);
        self.strategy_table
            .get(idx)
            .map(Vec::as_slice)
            .unwrap_or(&[1])
    }
}
