use crate::model::chance::Chance;
use serde::{Deserialize, Serialize};

/// The dice held by one side, kept sorted for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePool {
    dice: Vec<u8>,
}

impl DicePool {
    pub fn with_dice(dice: Vec<u8>) -> Self {
        let mut pool = Self { dice };
        pool.sort();
        pool
    }

    /// Rolls `size` fresh dice with `faces` faces each.
    pub fn roll<C: Chance + ?Sized>(size: usize, faces: u8, chance: &mut C) -> Self {
        let dice = (0..size)
            .map(|_| chance.between(1, u32::from(faces)) as u8)
            .collect();
        Self::with_dice(dice)
    }

    /// Re-rolls every die in place, keeping the pool size.
    pub fn reroll<C: Chance + ?Sized>(&mut self, faces: u8, chance: &mut C) {
        *self = Self::roll(self.dice.len(), faces, chance);
    }

    /// Removes one die. Returns `false` when the pool was already empty.
    pub fn shed(&mut self) -> bool {
        self.dice.pop().is_some()
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn dice(&self) -> &[u8] {
        &self.dice
    }

    pub fn iter(&self) -> impl Iterator<Item = &u8> {
        self.dice.iter()
    }

    pub fn count(&self, face: u8) -> usize {
        self.dice.iter().filter(|&&die| die == face).count()
    }

    /// Dice showing anything other than `face`.
    pub fn count_other(&self, face: u8) -> usize {
        self.dice.len() - self.count(face)
    }

    /// Faces in `1..=faces` that this pool does not hold at all.
    pub fn missing_faces(&self, faces: u8) -> Vec<u8> {
        (1..=faces).filter(|face| self.count(*face) == 0).collect()
    }

    /// Every face tied for the highest count, ascending.
    pub fn modes(&self) -> Vec<u8> {
        let best = self
            .dice
            .iter()
            .map(|&die| self.count(die))
            .max()
            .unwrap_or(0);
        let mut modes: Vec<u8> = self
            .dice
            .iter()
            .copied()
            .filter(|&die| self.count(die) == best)
            .collect();
        modes.dedup();
        modes
    }

    fn sort(&mut self) {
        self.dice.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::DicePool;
    use crate::model::chance::ScriptedChance;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn dice_are_sorted_for_display() {
        let pool = DicePool::with_dice(vec![4, 1, 3, 1]);
        assert_eq!(pool.dice(), &[1, 1, 3, 4]);
    }

    #[test]
    fn counts_and_modes() {
        let pool = DicePool::with_dice(vec![2, 2, 3, 3, 4]);
        assert_eq!(pool.count(2), 2);
        assert_eq!(pool.count_other(2), 3);
        assert_eq!(pool.modes(), vec![2, 3]);
        assert_eq!(pool.missing_faces(4), vec![1]);
    }

    #[test]
    fn shed_shrinks_to_zero_and_stops() {
        let mut pool = DicePool::with_dice(vec![1]);
        assert!(pool.shed());
        assert!(pool.is_empty());
        assert!(!pool.shed());
        assert!(pool.modes().is_empty());
    }

    #[test]
    fn roll_respects_face_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let pool = DicePool::roll(5, 3, &mut rng);
        assert_eq!(pool.len(), 5);
        assert!(pool.iter().all(|die| (1..=3).contains(die)));
    }

    #[test]
    fn scripted_roll_maps_draws_to_faces() {
        let mut chance = ScriptedChance::new([0.0, 0.3, 0.99]);
        let pool = DicePool::roll(3, 4, &mut chance);
        assert_eq!(pool.dice(), &[1, 2, 4]);
    }

    #[test]
    fn reroll_keeps_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = DicePool::with_dice(vec![1, 1, 1]);
        pool.shed();
        pool.reroll(6, &mut rng);
        assert_eq!(pool.len(), 2);
    }
}
