use serde::{Deserialize, Serialize};

use crate::*;

/// Resolved board dimensions and mine count for one level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl BoardConfig {
    pub const DEFAULT: Self = Self::new_unchecked(16, 16, 40);

    pub const fn new_unchecked(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }

    /// Clamps to a playable board: at least one cell per axis and at least
    /// one safe cell.
    pub fn new(width: Coord, height: Coord, mines: CellCount) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let max_mines = mult(width, height) - 1;
        if mines > max_mines {
            log::warn!(
                "Mine count {} does not fit a {}x{} board, clamped to {}",
                mines,
                width,
                height,
                max_mines
            );
        }
        Self::new_unchecked(width, height, mines.min(max_mines))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    pub const fn board_config(self) -> Option<BoardConfig> {
        match self {
            Self::Beginner => Some(BoardConfig::new_unchecked(9, 9, 10)),
            Self::Intermediate => Some(BoardConfig::new_unchecked(16, 16, 40)),
            Self::Expert => Some(BoardConfig::new_unchecked(30, 16, 99)),
            Self::Custom => None,
        }
    }
}

/// Exactly one of these holds at any time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Idle,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Everything known about one game session.
///
/// `flag_count` and `revealed_count` mirror the board and are kept in sync by
/// whoever mutates it, see [`GameState::sync_counts`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub status: GameStatus,
    pub difficulty: Difficulty,
    pub config: BoardConfig,
    pub flag_count: CellCount,
    pub revealed_count: CellCount,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    /// True until the first reveal.
    pub first_click: bool,
    pub mode_id: String,
    pub score: i64,
    pub level: u32,
    pub move_count: u32,
    /// Seconds left on the clock for timed modes.
    pub time_remaining: Option<i64>,
    pub continue_count: u32,
    pub continue_timestamps: Vec<Timestamp>,
    pub round: u32,
    pub streak: u32,
}

impl GameState {
    pub fn new(board: Board, config: BoardConfig, mode_id: impl Into<String>) -> Self {
        Self {
            board,
            status: GameStatus::Idle,
            difficulty: Difficulty::default(),
            config,
            flag_count: 0,
            revealed_count: 0,
            start_time: None,
            end_time: None,
            first_click: true,
            mode_id: mode_id.into(),
            score: 0,
            level: 1,
            move_count: 0,
            time_remaining: None,
            continue_count: 0,
            continue_timestamps: Vec::new(),
            round: 1,
            streak: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Milliseconds played, frozen at `end_time` once the game has ended.
    pub fn elapsed_ms(&self, now: Timestamp) -> u64 {
        match self.start_time {
            Some(start) => self.end_time.unwrap_or(now).saturating_sub(start),
            None => 0,
        }
    }

    /// Recomputes the flag and reveal counters from the board.
    pub fn sync_counts(&mut self) {
        self.flag_count = self.board.count_flags();
        self.revealed_count = self.board.count_revealed();
    }
}
