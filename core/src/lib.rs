//! Rules and progression engine for Minesweeper game modes.
//!
//! [`ModeManager`] decides board sizing, win/lose and continue pricing for a
//! [`ModeDefinition`], [`calculate_score`] folds a finished game into a score,
//! [`History`] keeps undo/redo snapshots, and the per-mode mechanics live in
//! [`MemoryModeManager`], [`MultiRoundManager`], [`ZenModeHandler`],
//! [`BlindVisibility`] and [`CustomBoardBuilder`].
//! [`GameSession`] wires them together for a single player.

extern crate alloc;

pub use board::*;
pub use clock::*;
pub use error::*;
pub use history::*;
pub use mode::*;
pub use rules::*;
pub use scoring::*;
pub use session::*;
pub use special::*;
pub use state::*;
pub use types::*;

mod board;
mod clock;
mod error;
mod history;
mod mode;
mod rules;
mod scoring;
mod session;
mod special;
mod state;
mod types;
