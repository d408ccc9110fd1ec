use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryModeState {
    pub phase: FlowPhase,
    pub phase_start_time: Timestamp,
    pub memorize_end_time: Option<Timestamp>,
    /// Cells shown during the reveal phase.
    pub revealed_cells: HashSet<Coord2>,
    pub correct_recalls: u32,
    pub incorrect_recalls: u32,
}

/// Runs the reveal, memorize, play, complete sequence of memory mode.
///
/// Transitions are driven by the caller; [`Self::should_transition_phase`]
/// only reports when the memorize countdown has run out.
#[derive(Clone, Debug)]
pub struct MemoryModeManager<C = SystemClock> {
    state: MemoryModeState,
    reveal_duration_ms: u64,
    clock: C,
}

impl MemoryModeManager {
    pub fn new(reveal_duration_ms: u64) -> Self {
        Self::with_clock(reveal_duration_ms, SystemClock)
    }
}

impl<C: Clock> MemoryModeManager<C> {
    pub fn with_clock(reveal_duration_ms: u64, clock: C) -> Self {
        Self {
            state: Self::fresh_state(clock.now()),
            reveal_duration_ms,
            clock,
        }
    }

    fn fresh_state(now: Timestamp) -> MemoryModeState {
        MemoryModeState {
            phase: FlowPhase::Reveal,
            phase_start_time: now,
            memorize_end_time: None,
            revealed_cells: HashSet::new(),
            correct_recalls: 0,
            incorrect_recalls: 0,
        }
    }

    pub fn from_flow(flow: &GameFlow, clock: C) -> Self {
        Self::with_clock(flow.reveal_duration_ms, clock)
    }

    pub fn state(&self) -> &MemoryModeState {
        &self.state
    }

    pub fn phase(&self) -> FlowPhase {
        self.state.phase
    }

    pub fn reveal_duration_ms(&self) -> u64 {
        self.reveal_duration_ms
    }

    fn enter(&mut self, phase: FlowPhase) {
        log::debug!("Memory phase {:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
        self.state.phase_start_time = self.clock.now();
    }

    /// Shows every safe cell and remembers which ones were shown. Returns how
    /// many cells were shown.
    pub fn start_reveal_phase(&mut self, board: &mut Board) -> usize {
        self.enter(FlowPhase::Reveal);
        self.state.memorize_end_time = None;
        self.state.revealed_cells.clear();

        let safe: Vec<Coord2> = board
            .cells()
            .filter(|cell| !cell.is_mine)
            .map(CellState::coords)
            .collect();
        for &coords in &safe {
            if let Some(cell) = board.cell_mut(coords) {
                cell.is_revealed = true;
            }
        }
        self.state.revealed_cells.extend(safe);
        self.state.revealed_cells.len()
    }

    /// Starts the countdown. The board is left as it is.
    pub fn start_memorize_phase(&mut self) {
        self.enter(FlowPhase::Memorize);
        self.state.memorize_end_time = Some(self.state.phase_start_time.saturating_add(self.reveal_duration_ms));
    }

    /// Hides every cell again and hands the board to the player.
    pub fn start_play_phase(&mut self, board: &mut Board) {
        self.enter(FlowPhase::Play);
        board.hide_all();
    }

    pub fn complete(&mut self) {
        self.enter(FlowPhase::Complete);
    }

    pub fn should_transition_phase(&self) -> bool {
        self.state.phase == FlowPhase::Memorize
            && self
                .state
                .memorize_end_time
                .is_some_and(|end| self.clock.now() >= end)
    }

    /// Milliseconds left to memorize, zero outside the memorize phase.
    pub fn remaining_memorize_ms(&self) -> u64 {
        match (self.state.phase, self.state.memorize_end_time) {
            (FlowPhase::Memorize, Some(end)) => end.saturating_sub(self.clock.now()),
            _ => 0,
        }
    }

    pub fn was_cell_shown_in_reveal(&self, coords: Coord2) -> bool {
        self.state.revealed_cells.contains(&coords)
    }

    pub fn record_recall(&mut self, correct: bool) {
        if correct {
            self.state.correct_recalls += 1;
        } else {
            self.state.incorrect_recalls += 1;
        }
    }

    /// Share of recalls that were correct, zero before any recall.
    pub fn calculate_accuracy(&self) -> f64 {
        let total = self.state.correct_recalls + self.state.incorrect_recalls;
        if total == 0 {
            return 0.0;
        }
        f64::from(self.state.correct_recalls) / f64::from(total)
    }

    pub fn reset(&mut self) {
        self.state = Self::fresh_state(self.clock.now());
    }
}
