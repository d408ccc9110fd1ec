//! One player's game: input goes through the mode rules, the board
//! primitives apply it, and every accepted move is snapshotted.

use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub history: HistoryConfig,
    pub difficulty: Difficulty,
    /// Seed for mine placement.
    pub seed: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Ignored,
    Revealed { cells: CellCount },
    Flagged,
    Unflagged,
    /// A mine was hit but the game goes on.
    MineHit,
    Won,
    Lost,
}

#[derive(Clone, Debug)]
pub struct GameSession<C = SystemClock> {
    rules: ModeManager<C>,
    state: GameState,
    history: History<C>,
    config: SessionConfig,
    mines_placed: bool,
    zen: Option<ZenModeHandler>,
    memory: Option<MemoryModeManager<C>>,
    last_tick: Option<Timestamp>,
    tick_carry_ms: u64,
}

impl GameSession {
    pub fn new(mode: ModeDefinition, config: SessionConfig) -> Self {
        Self::with_clock(mode, config, SystemClock)
    }
}

impl<C: Clock + Clone> GameSession<C> {
    pub fn with_clock(mode: ModeDefinition, config: SessionConfig, clock: C) -> Self {
        let rules = ModeManager::with_clock(mode, clock);
        let board_config = rules.board_config(1);
        let board = Board::empty(board_config.width, board_config.height);
        Self::start(rules, board, false, config)
    }

    /// Session on a board whose mines are already placed.
    pub fn with_board(mode: ModeDefinition, board: Board, config: SessionConfig, clock: C) -> Self {
        Self::start(ModeManager::with_clock(mode, clock), board, true, config)
    }

    fn start(rules: ModeManager<C>, mut board: Board, mines_placed: bool, config: SessionConfig) -> Self {
        let clock = rules.clock().clone();
        let memory = rules
            .mode()
            .rules
            .game_flow
            .as_ref()
            .map(|flow| MemoryModeManager::from_flow(flow, clock.clone()));

        // without a safe first click there is nothing to wait for
        let place_now = !mines_placed && (memory.is_some() || !rules.is_first_click_safe());
        if place_now {
            board.place_mines(rules.board_config(1).mines, None, config.seed);
        }

        let mut state = rules.initialize_game_state(board, config.difficulty);
        if mines_placed {
            state.config.mines = state.board.mine_count();
        }

        let zen = (!rules.mode().rules.reveal_on_mine_click).then(ZenModeHandler::new);
        let mut history = History::with_clock(config.history, clock);
        history.save_state(&state, "start");

        log::debug!(
            "Session started in mode {:?} on a {}x{} board",
            rules.id(),
            state.config.width,
            state.config.height
        );

        Self {
            rules,
            state,
            history,
            config,
            mines_placed: mines_placed || place_now,
            zen,
            memory,
            last_tick: None,
            tick_carry_ms: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &ModeManager<C> {
        &self.rules
    }

    pub fn history(&self) -> &History<C> {
        &self.history
    }

    pub fn zen(&self) -> Option<&ZenModeHandler> {
        self.zen.as_ref()
    }

    pub fn memory(&self) -> Option<&MemoryModeManager<C>> {
        self.memory.as_ref()
    }

    /// Whether the number of a revealed cell may be shown to the player.
    pub fn shows_number(&self, coords: Coord2) -> bool {
        let Some(cell) = self.state.board.get(coords) else {
            return false;
        };
        cell.is_revealed
            && match self.rules.mode().rules.number_visibility {
                NumberVisibility::Always => true,
                NumberVisibility::Conditional => BlindVisibility::is_cell_visible(&self.state.board, coords),
            }
    }

    /// Shows the board and starts the memorize countdown.
    pub fn start_memory_phase(&mut self) -> Result<()> {
        let memory = self.memory.as_mut().ok_or(RulesError::GameNotActive)?;
        memory.start_reveal_phase(&mut self.state.board);
        memory.start_memorize_phase();
        self.state.sync_counts();
        Ok(())
    }

    fn in_play_phase(&self) -> bool {
        self.memory
            .as_ref()
            .is_none_or(|memory| memory.phase() == FlowPhase::Play)
    }

    fn check_accepting_moves(&self) -> Result<()> {
        if self.state.is_finished() || !self.in_play_phase() {
            Err(RulesError::GameNotActive)
        } else {
            Ok(())
        }
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<MoveOutcome> {
        let coords = self.state.board.validate_coords(coords)?;
        self.check_accepting_moves()?;

        let cell = self.state.board[coords];
        // the opening click is always allowed, blind play has no flags yet
        let allowed = if self.state.first_click {
            !cell.is_flagged && !cell.is_revealed
        } else {
            self.rules.should_reveal_cell(&cell, &self.state)
        };
        if !allowed {
            return Ok(MoveOutcome::Ignored);
        }

        if self.state.first_click {
            if !self.mines_placed {
                let safe = self.rules.is_first_click_safe().then_some(coords);
                self.state.board.place_mines(self.state.config.mines, safe, self.config.seed);
                self.mines_placed = true;
            }
            self.state.first_click = false;
            let now = self.rules.clock().now();
            self.state.start_time = Some(now);
            self.state.status = GameStatus::Playing;
            self.resume_clock(now);
        }

        let revealed = self.state.board.reveal_cell(coords, self.rules.should_cascade())?;
        self.state.move_count += 1;

        if let Some(memory) = self.memory.as_mut() {
            let recalled = memory.was_cell_shown_in_reveal(coords);
            memory.record_recall(recalled);
        }

        let outcome = if revealed.hit_mine {
            if let Some(zen) = self.zen.as_mut() {
                zen.handle_mine_click(coords);
            }
            if self.rules.check_lose_condition(&self.state, true) {
                self.finish(GameStatus::Lost);
                MoveOutcome::Lost
            } else {
                MoveOutcome::MineHit
            }
        } else {
            self.state.sync_counts();
            self.state.score += calculate_action_score(ScoreAction::Reveal {
                cells: revealed.revealed,
                adjacent_mines: revealed.adjacent_mines,
            });

            if self.rules.check_win_condition(&self.state) {
                self.finish(GameStatus::Won);
                MoveOutcome::Won
            } else if self.rules.check_lose_condition(&self.state, false) {
                self.finish(GameStatus::Lost);
                MoveOutcome::Lost
            } else {
                MoveOutcome::Revealed {
                    cells: revealed.revealed,
                }
            }
        };

        self.history.save_state(&self.state, format!("reveal {},{}", coords.0, coords.1));
        Ok(outcome)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MoveOutcome> {
        let coords = self.state.board.validate_coords(coords)?;
        self.check_accepting_moves()?;

        if !self.rules.are_flags_allowed() {
            return Ok(MoveOutcome::Ignored);
        }

        let (outcome, action) = match self.state.board.toggle_flag(coords)? {
            MarkOutcome::NoChange => return Ok(MoveOutcome::Ignored),
            MarkOutcome::Flagged => (MoveOutcome::Flagged, ScoreAction::Flag),
            MarkOutcome::Unflagged => (MoveOutcome::Unflagged, ScoreAction::Unflag),
        };
        self.state.sync_counts();
        self.state.score += calculate_action_score(action);

        self.history.save_state(&self.state, format!("flag {},{}", coords.0, coords.1));
        Ok(outcome)
    }

    fn finish(&mut self, status: GameStatus) {
        self.state.status = status;
        self.state.end_time = Some(self.rules.clock().now());
        match status {
            GameStatus::Won => self.state.streak += 1,
            GameStatus::Lost => {
                self.state.streak = 0;
                self.state.board.reveal_all_mines();
                self.state.sync_counts();
            }
            GameStatus::Idle | GameStatus::Playing => {}
        }
        if let Some(memory) = self.memory.as_mut() {
            memory.complete();
        }
        log::debug!("Game {:?} after {} moves", status, self.state.move_count);
    }

    /// Re-evaluates the clock and the memory countdown. Call it on whatever
    /// cadence the caller redraws at.
    pub fn tick(&mut self) -> Option<MoveOutcome> {
        let now = self.rules.clock().now();

        if let Some(memory) = self.memory.as_mut() {
            if memory.should_transition_phase() {
                memory.start_play_phase(&mut self.state.board);
                self.state.sync_counts();
            }
        }

        if !self.state.is_playing() {
            self.last_tick = None;
            return None;
        }

        let since = self.last_tick.unwrap_or(now);
        self.last_tick = Some(now);
        self.tick_carry_ms += now.saturating_sub(since);
        let whole_secs = self.tick_carry_ms / 1000;
        self.tick_carry_ms %= 1000;

        if let Some(remaining) = self.state.time_remaining.as_mut() {
            *remaining -= whole_secs as i64;
        }

        if self.rules.check_lose_condition(&self.state, false) {
            self.finish(GameStatus::Lost);
            self.history.save_state(&self.state, "time up");
            return Some(MoveOutcome::Lost);
        }
        None
    }

    /// Buys a continue for a lost game, returns the price paid.
    pub fn continue_game(&mut self) -> Result<u64> {
        if !self.rules.can_continue() {
            return Err(RulesError::ContinueNotAllowed);
        }
        if self.state.status != GameStatus::Lost {
            return Err(RulesError::GameNotActive);
        }

        let cost = self.rules.continue_cost(&self.state);
        self.rules.apply_continue(&mut self.state);
        self.state.board.conceal_mines();
        self.state.sync_counts();
        self.resume_clock(self.rules.clock().now());

        self.history.save_state(&self.state, "continue");
        Ok(cost)
    }

    pub fn undo(&mut self) -> bool {
        self.restore(|history| history.undo())
    }

    pub fn redo(&mut self) -> bool {
        self.restore(|history| history.redo())
    }

    fn restore(&mut self, step: impl FnOnce(&mut History<C>) -> Option<GameState>) -> bool {
        match step(&mut self.history) {
            Some(state) => {
                self.state = state;
                self.resume_clock(self.rules.clock().now());
                true
            }
            None => false,
        }
    }

    /// Countdown restarts from `now`, time before it has been charged already.
    fn resume_clock(&mut self, now: Timestamp) {
        self.last_tick = Some(now);
        self.tick_carry_ms = 0;
    }

    /// Score of the game as it stands, from the mode's formulas.
    pub fn final_score(&self) -> i64 {
        let elapsed = self.state.elapsed_ms(self.rules.clock().now());
        calculate_score(&ScoreContext::new(&self.state, self.rules.mode(), elapsed))
    }

    /// Starts the next level after a win. Score and streak carry over; the
    /// board, clock and history start fresh. Returns `None` on the last level.
    pub fn advance_level(&mut self) -> Option<LevelConfig> {
        if self.state.status != GameStatus::Won || self.rules.is_final_level(self.state.level) {
            return None;
        }

        let next = self.rules.next_level_config(self.state.level);
        let score = self.state.score + self.final_score();
        let streak = self.state.streak;
        let continues = (self.state.continue_count, self.state.continue_timestamps.clone());

        let mut board = Board::empty(next.board.width, next.board.height);
        let place_now = self.memory.is_some() || !self.rules.is_first_click_safe();
        if place_now {
            board.place_mines(next.board.mines, None, self.config.seed);
        }

        let mut state = GameState::new(board, next.board, self.rules.id());
        state.difficulty = self.state.difficulty;
        state.level = next.level;
        state.score = score;
        state.streak = streak;
        state.time_remaining = next.time_limit.map(i64::from);
        (state.continue_count, state.continue_timestamps) = continues;

        self.state = state;
        self.mines_placed = place_now;
        self.last_tick = None;
        self.tick_carry_ms = 0;
        if let Some(memory) = self.memory.as_mut() {
            memory.reset();
        }
        self.history.clear();
        self.history.save_state(&self.state, format!("level {}", next.level));

        log::debug!("Advanced to level {} ({:?})", next.level, next.board);
        Some(next)
    }
}
