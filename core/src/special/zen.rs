use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::*;

/// Tracks mine clicks as mistakes; zen games never end on a mine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZenModeHandler {
    mistakes: HashSet<Coord2>,
}

impl ZenModeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a mine click. Returns whether it was a new mistake; the same
    /// cell only ever counts once.
    pub fn handle_mine_click(&mut self, coords: Coord2) -> bool {
        let fresh = self.mistakes.insert(coords);
        if fresh {
            log::debug!("Zen mistake at {:?}, {} so far", coords, self.mistakes.len());
        }
        fresh
    }

    pub fn mistake_count(&self) -> usize {
        self.mistakes.len()
    }

    pub fn is_mistake(&self, coords: Coord2) -> bool {
        self.mistakes.contains(&coords)
    }

    /// Mistake positions in row-major order.
    pub fn mistakes(&self) -> Vec<Coord2> {
        let mut mistakes: Vec<_> = self.mistakes.iter().copied().collect();
        mistakes.sort_unstable_by_key(|&(x, y)| (y, x));
        mistakes
    }

    pub const fn should_end_game(&self) -> bool {
        false
    }

    pub fn reset(&mut self) {
        self.mistakes.clear();
    }
}
