use serde::{Deserialize, Serialize};

/// Per-face "guaranteed at least" estimates for the rival's hidden dice.
///
/// Entries only ratchet upward within a round; [`BeliefMemory::reset`] zeroes
/// them when a call resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefMemory {
    floors: Vec<u8>,
}

impl BeliefMemory {
    pub fn new(faces: u8) -> Self {
        Self {
            floors: vec![0; usize::from(faces)],
        }
    }

    pub fn faces(&self) -> u8 {
        self.floors.len() as u8
    }

    /// Floor recorded for `face`; faces outside the die read as zero.
    pub fn get(&self, face: u8) -> u8 {
        face.checked_sub(1)
            .and_then(|idx| self.floors.get(usize::from(idx)))
            .copied()
            .unwrap_or(0)
    }

    /// Raises the floor for `face` to `estimate` if that is higher.
    /// Returns whether the entry changed.
    pub fn raise(&mut self, face: u8, estimate: u8) -> bool {
        let Some(slot) = face
            .checked_sub(1)
            .and_then(|idx| self.floors.get_mut(usize::from(idx)))
        else {
            return false;
        };
        if estimate > *slot {
            *slot = estimate;
            true
        } else {
            false
        }
    }

    /// Sum of the floors for every face except `face`.
    pub fn sum_excluding(&self, face: u8) -> usize {
        self.iter()
            .filter(|(f, _)| *f != face)
            .map(|(_, floor)| usize::from(floor))
            .sum()
    }

    pub fn total(&self) -> usize {
        self.floors.iter().map(|&floor| usize::from(floor)).sum()
    }

    /// Largest floor across all faces.
    pub fn peak(&self) -> u8 {
        self.floors.iter().copied().max().unwrap_or(0)
    }

    pub fn is_blank(&self) -> bool {
        self.peak() == 0
    }

    pub fn reset(&mut self) {
        self.floors.iter_mut().for_each(|floor| *floor = 0);
    }

    /// `(face, floor)` pairs in face order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.floors
            .iter()
            .enumerate()
            .map(|(idx, &floor)| (idx as u8 + 1, floor))
    }
}

#[cfg(test)]
mod tests {
    use super::BeliefMemory;

    #[test]
    fn starts_blank() {
        let memory = BeliefMemory::new(4);
        assert_eq!(memory.faces(), 4);
        assert!(memory.is_blank());
        assert_eq!(memory.total(), 0);
    }

    #[test]
    fn raise_only_moves_upward() {
        let mut memory = BeliefMemory::new(4);
        assert!(memory.raise(2, 2));
        assert!(!memory.raise(2, 1));
        assert!(!memory.raise(2, 2));
        assert_eq!(memory.get(2), 2);
        assert!(memory.raise(2, 3));
        assert_eq!(memory.peak(), 3);
    }

    #[test]
    fn out_of_range_faces_are_ignored() {
        let mut memory = BeliefMemory::new(3);
        assert!(!memory.raise(0, 2));
        assert!(!memory.raise(4, 2));
        assert_eq!(memory.get(4), 0);
        assert!(memory.is_blank());
    }

    #[test]
    fn sum_excluding_skips_the_named_face() {
        let mut memory = BeliefMemory::new(4);
        memory.raise(1, 1);
        memory.raise(3, 2);
        assert_eq!(memory.sum_excluding(3), 1);
        assert_eq!(memory.sum_excluding(2), 3);
    }

    #[test]
    fn reset_zeroes_every_face() {
        let mut memory = BeliefMemory::new(4);
        memory.raise(4, 3);
        memory.reset();
        assert!(memory.is_blank());
        assert_eq!(memory.faces(), 4);
    }
}
