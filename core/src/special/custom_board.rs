use serde::{Deserialize, Serialize};

use crate::*;

pub const MIN_CUSTOM_SIDE: Coord = 5;
pub const MAX_CUSTOM_SIDE: Coord = 50;
/// Largest share of the board that may be mines.
pub const MAX_MINE_DENSITY: f64 = 0.8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomBoard {
    pub config: BoardConfig,
    pub time_limit: Option<u32>,
    pub first_click_safe: bool,
}

impl CustomBoard {
    pub fn mine_density(&self) -> f64 {
        f64::from(self.config.mines) / f64::from(self.config.total_cells())
    }

    /// The custom mode with this board and clock applied.
    pub fn to_mode(&self, base: &ModeDefinition) -> ModeDefinition {
        let mut mode = base.clone();
        mode.config.board_size = BoardSize::Fixed {
            width: self.config.width,
            height: self.config.height,
        };
        mode.config.mine_count = MineCount::Fixed(self.config.mines);
        mode.config.time_limit = self.time_limit;
        mode.config.difficulty_progression = None;
        mode.rules.first_click_safe = self.first_click_safe;
        mode
    }
}

/// Builds a custom board, clamping every input instead of rejecting it.
///
/// The mine cap is taken from the width and height set so far, so set the
/// dimensions before the mine count.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomBoardBuilder {
    width: Coord,
    height: Coord,
    mines: CellCount,
    time_limit: Option<u32>,
    first_click_safe: bool,
}

impl Default for CustomBoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomBoardBuilder {
    pub fn new() -> Self {
        let BoardConfig {
            width,
            height,
            mines,
        } = BoardConfig::DEFAULT;
        Self {
            width,
            height,
            mines,
            time_limit: None,
            first_click_safe: true,
        }
    }

    fn max_mines(&self) -> CellCount {
        (f64::from(mult(self.width, self.height)) * MAX_MINE_DENSITY).floor() as CellCount
    }

    fn clamp_side(side: u32) -> Coord {
        side.clamp(MIN_CUSTOM_SIDE.into(), MAX_CUSTOM_SIDE.into()) as Coord
    }

    pub fn set_width(mut self, width: u32) -> Self {
        self.width = Self::clamp_side(width);
        self
    }

    pub fn set_height(mut self, height: u32) -> Self {
        self.height = Self::clamp_side(height);
        self
    }

    pub fn set_mine_count(mut self, mines: u32) -> Self {
        let max = self.max_mines();
        let clamped = mines.clamp(1, max.into()) as CellCount;
        if u32::from(clamped) != mines {
            log::warn!("Custom mine count {} clamped to {}", mines, clamped);
        }
        self.mines = clamped;
        self
    }

    pub fn set_time_limit(mut self, time_limit: Option<u32>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn set_first_click_safe(mut self, safe: bool) -> Self {
        self.first_click_safe = safe;
        self
    }

    /// Finishes the board. Shrinking the board after setting the mine count
    /// pulls the count back under the cap; growing it never raises it.
    pub fn build(&self) -> CustomBoard {
        CustomBoard {
            config: BoardConfig::new_unchecked(self.width, self.height, self.mines.min(self.max_mines())),
            time_limit: self.time_limit,
            first_click_safe: self.first_click_safe,
        }
    }
}
