use serde::{Deserialize, Serialize};

use crate::*;

/// Board and clock for one level of a mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    pub board: BoardConfig,
    pub time_limit: Option<u32>,
}

/// Applies one [`ModeDefinition`] to game states.
///
/// Holds no state besides the definition and a clock, so one manager can
/// serve any number of states of the same mode.
#[derive(Clone, Debug)]
pub struct ModeManager<C = SystemClock> {
    mode: ModeDefinition,
    clock: C,
}

impl ModeManager {
    pub fn new(mode: ModeDefinition) -> Self {
        Self::with_clock(mode, SystemClock)
    }
}

impl<C: Clock> ModeManager<C> {
    pub fn with_clock(mode: ModeDefinition, clock: C) -> Self {
        Self { mode, clock }
    }

    pub fn mode(&self) -> &ModeDefinition {
        &self.mode
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fresh state at level 1 for a board built by the caller.
    pub fn initialize_game_state(&self, board: Board, difficulty: Difficulty) -> GameState {
        let resolved = self.board_config(1);
        let config = BoardConfig::new(board.width(), board.height(), resolved.mines);

        let mut state = GameState::new(board, config, self.mode.id.clone());
        state.difficulty = difficulty;
        state.time_remaining = self.time_limit(1).map(i64::from);
        state.sync_counts();
        state
    }

    /// Resolves board size and mines for `level`.
    ///
    /// Dynamic boards go through the progression, fixed boards may still take
    /// their mine count from it, and anything else gets the 16x16/40 default.
    /// Fields the progression leaves out default to 16, 16 and 40.
    pub fn board_config(&self, level: u32) -> BoardConfig {
        let config = &self.mode.config;
        let progression = config.difficulty_progression.as_ref();

        match (config.board_size, progression) {
            (BoardSize::Dynamic, Some(progression)) => {
                let spec = progression.resolver.resolve(level);
                BoardConfig::new(
                    spec.width.unwrap_or(BoardConfig::DEFAULT.width),
                    spec.height.unwrap_or(BoardConfig::DEFAULT.height),
                    spec.mines.unwrap_or(BoardConfig::DEFAULT.mines),
                )
            }
            (BoardSize::Fixed { width, height }, _) => {
                let mines = match config.mine_count {
                    MineCount::Fixed(mines) => mines,
                    MineCount::Dynamic => progression
                        .and_then(|progression| progression.resolver.resolve(level).mines)
                        .unwrap_or(BoardConfig::DEFAULT.mines),
                };
                BoardConfig::new(width, height, mines)
            }
            (BoardSize::Dynamic, None) => {
                log::warn!(
                    "Mode {:?} has a dynamic board but no progression, using the default board",
                    self.mode.id
                );
                BoardConfig::DEFAULT
            }
        }
    }

    pub fn time_elapsed_ms(&self, state: &GameState) -> u64 {
        state
            .start_time
            .map(|start| self.clock.elapsed_since(start))
            .unwrap_or(0)
    }

    fn rule_view<'a>(&self, state: &'a GameState, hit_mine: bool) -> RuleView<'a> {
        RuleView {
            state,
            hit_mine,
            game_over: state.is_finished(),
            time_elapsed_ms: self.time_elapsed_ms(state),
            width: state.config.width,
            height: state.config.height,
            mines: state.config.mines,
        }
    }

    pub fn check_win_condition(&self, state: &GameState) -> bool {
        if let Some(predicate) = &self.mode.rules.win_condition {
            return predicate.call(&self.rule_view(state, false));
        }

        check_win_condition(state.config.total_cells(), state.config.mines, state.revealed_count)
    }

    /// Whether the game is lost. A mine hit only loses when the mode ends the
    /// game on mines.
    pub fn check_lose_condition(&self, state: &GameState, hit_mine: bool) -> bool {
        if let Some(predicate) = &self.mode.rules.lose_condition {
            return predicate.call(&self.rule_view(state, hit_mine));
        }

        if state.time_remaining.is_some_and(|remaining| remaining <= 0) {
            return true;
        }

        if self
            .mode
            .config
            .move_limit
            .is_some_and(|limit| state.move_count >= limit)
        {
            return true;
        }

        hit_mine && self.mode.rules.reveal_on_mine_click
    }

    pub fn should_reveal_cell(&self, cell: &CellState, state: &GameState) -> bool {
        if cell.is_flagged || cell.is_revealed {
            return false;
        }

        match self.mode.rules.number_visibility {
            NumberVisibility::Always => true,
            NumberVisibility::Conditional => BlindVisibility::is_cell_visible(&state.board, cell.coords()),
        }
    }

    pub fn should_cascade(&self) -> bool {
        self.mode.rules.cascade_reveal
    }

    pub fn is_first_click_safe(&self) -> bool {
        self.mode.rules.first_click_safe
    }

    pub fn are_flags_allowed(&self) -> bool {
        self.mode.rules.allow_flags
    }

    /// Seconds allowed for `level`, from the progression when it has one.
    pub fn time_limit(&self, level: u32) -> Option<u32> {
        self.mode
            .config
            .difficulty_progression
            .as_ref()
            .and_then(|progression| progression.resolver.resolve(level).time_limit)
            .or(self.mode.config.time_limit)
    }

    pub fn max_level(&self) -> Option<u32> {
        self.mode
            .config
            .difficulty_progression
            .as_ref()
            .and_then(|progression| progression.max_level)
    }

    pub fn is_final_level(&self, level: u32) -> bool {
        self.max_level().is_some_and(|max| level >= max)
    }

    /// Configuration of the level after `current_level`, clamped at the
    /// mode's max level.
    pub fn next_level_config(&self, current_level: u32) -> LevelConfig {
        let level = match self.max_level() {
            Some(max) if current_level >= max => current_level,
            _ => current_level.saturating_add(1),
        };

        LevelConfig {
            level,
            board: self.board_config(level),
            time_limit: self.time_limit(level),
        }
    }

    pub fn can_continue(&self) -> bool {
        self.mode.continues.allowed
    }

    /// Price of the next continue.
    ///
    /// Base cost, compounded 1.5x per continue already bought, plus ten per
    /// level on progression modes, then 20% off within the first 30 seconds.
    pub fn continue_cost(&self, state: &GameState) -> u64 {
        let mut cost = f64::from(self.mode.continues.base_cost);

        if state.continue_count > 0 {
            cost *= 1.5_f64.powi(state.continue_count as i32);
        }

        if self.mode.category == ModeCategory::Progression {
            cost += f64::from(state.level) * 10.0;
        }

        let elapsed_secs = self.time_elapsed_ms(state) as f64 / 1000.0;
        if elapsed_secs < 30.0 {
            cost *= 0.8;
        }

        cost.floor() as u64
    }

    /// Resumes a finished game and grants the mode's continue benefit.
    pub fn apply_continue(&self, state: &mut GameState) {
        state.continue_count += 1;
        state.continue_timestamps.push(self.clock.now());
        state.status = GameStatus::Playing;
        state.end_time = None;

        match self.mode.continues.benefit {
            ContinueBenefit::None => {}
            ContinueBenefit::RefundMoves(moves) => {
                state.move_count = state.move_count.saturating_sub(moves);
            }
            ContinueBenefit::AddTime(secs) => {
                state.time_remaining = Some(state.time_remaining.unwrap_or(0) + i64::from(secs));
            }
            ContinueBenefit::ResetTime => {
                state.time_remaining = Some(i64::from(self.mode.config.time_limit.unwrap_or(60)));
            }
        }

        log::debug!(
            "Continue #{} in mode {:?}, benefit {:?}",
            state.continue_count,
            self.mode.id,
            self.mode.continues.benefit
        );
    }

    pub fn has_custom_game_flow(&self) -> bool {
        self.mode.rules.game_flow.is_some()
    }

    pub fn game_flow_phases(&self) -> &[FlowPhase] {
        self.mode
            .rules
            .game_flow
            .as_ref()
            .map(|flow| flow.phases.as_slice())
            .unwrap_or_default()
    }

    pub fn is_progressive_mode(&self) -> bool {
        self.mode.category == ModeCategory::Progression || self.mode.config.difficulty_progression.is_some()
    }

    pub fn is_timed_mode(&self) -> bool {
        self.mode.config.time_limit.is_some()
    }

    pub fn has_move_limit(&self) -> bool {
        self.mode.config.move_limit.is_some()
    }

    pub fn move_limit(&self) -> Option<u32> {
        self.mode.config.move_limit
    }

    pub fn special_rules(&self) -> &[String] {
        &self.mode.config.special_rules
    }

    pub fn id(&self) -> &str {
        &self.mode.id
    }

    pub fn name(&self) -> &str {
        &self.mode.name
    }

    pub fn category(&self) -> ModeCategory {
        self.mode.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(mode: ModeDefinition) -> ModeManager<ManualClock> {
        ModeManager::with_clock(mode, ManualClock::new(100_000))
    }

    fn started_state(manager: &ModeManager<ManualClock>, started_ms_ago: u64) -> GameState {
        let config = manager.board_config(1);
        let mut state = manager.initialize_game_state(Board::empty(config.width, config.height), Difficulty::Custom);
        state.status = GameStatus::Playing;
        state.start_time = Some(manager.clock().now() - started_ms_ago);
        state
    }

    #[test]
    fn fixed_board_ignores_level() {
        let manager = manager(classic());

        let first = manager.board_config(1);
        assert_eq!(first, BoardConfig::new_unchecked(16, 16, 40));
        for level in [2, 7, 99] {
            assert_eq!(manager.board_config(level), first);
        }
    }

    #[test]
    fn dynamic_board_without_progression_defaults() {
        let mut mode = ModeDefinition::new("broken", "Broken", ModeCategory::Custom);
        mode.config.board_size = BoardSize::Dynamic;

        assert_eq!(manager(mode).board_config(3), BoardConfig::new_unchecked(16, 16, 40));
    }

    #[test]
    fn partial_progression_fields_default() {
        let mut mode = ModeDefinition::new("partial", "Partial", ModeCategory::Progression);
        mode.config.board_size = BoardSize::Dynamic;
        mode.config.difficulty_progression = Some(Progression {
            resolver: LevelResolver::custom(|level| LevelSpec {
                width: Some(8 + level as Coord),
                ..Default::default()
            }),
            max_level: None,
        });

        assert_eq!(manager(mode).board_config(2), BoardConfig::new_unchecked(10, 16, 40));
    }

    #[test]
    fn fixed_board_with_dynamic_mines() {
        let mut mode = ModeDefinition::new("mines", "Mines", ModeCategory::Custom);
        mode.config = ModeConfig {
            board_size: BoardSize::Fixed { width: 10, height: 10 },
            mine_count: MineCount::Dynamic,
            ..Default::default()
        };
        assert_eq!(manager(mode.clone()).board_config(4).mines, 40);

        mode.config.difficulty_progression = Some(Progression {
            resolver: LevelResolver::custom(|level| LevelSpec {
                mines: Some(level as CellCount * 5),
                ..Default::default()
            }),
            max_level: None,
        });
        assert_eq!(manager(mode).board_config(4), BoardConfig::new_unchecked(10, 10, 20));
    }

    #[test]
    fn board_config_never_fills_board() {
        let mut mode = ModeDefinition::new("dense", "Dense", ModeCategory::Custom);
        mode.config.board_size = BoardSize::Fixed { width: 5, height: 5 };
        mode.config.mine_count = MineCount::Fixed(500);

        let config = manager(mode).board_config(1);
        assert!(config.mines < config.total_cells());
    }

    #[test]
    fn progression_levels_resolve_and_clamp_at_max() {
        let manager = manager(progressive());

        assert_eq!(manager.board_config(1), BoardConfig::new_unchecked(8, 8, 8));
        assert_eq!(manager.board_config(3), BoardConfig::new_unchecked(12, 12, 20));

        let next = manager.next_level_config(3);
        assert_eq!(next.level, 4);
        assert_eq!(next.board, manager.board_config(4));

        let capped = manager.next_level_config(10);
        assert_eq!(capped.level, 10);
        assert_eq!(capped.board, manager.board_config(10));
        assert!(manager.is_final_level(10));
    }

    #[test]
    fn next_level_saturates_without_max() {
        let manager = manager(classic());

        let next = manager.next_level_config(u32::MAX);
        assert_eq!(next.level, u32::MAX);
        assert_eq!(next.board, BoardConfig::new_unchecked(16, 16, 40));
    }

    #[test]
    fn progression_time_limit_wins_over_static() {
        let manager = manager(survival());

        assert_eq!(manager.time_limit(1), Some(300));
        assert_eq!(manager.time_limit(3), Some(270));
        assert_eq!(ModeManager::with_clock(classic(), ManualClock::new(0)).time_limit(1), None);
    }

    #[test]
    fn initialize_seeds_time_limit_and_zeroes_counters() {
        let manager = manager(time_attack());

        let state = manager.initialize_game_state(Board::empty(16, 16), Difficulty::Intermediate);

        assert_eq!(state.level, 1);
        assert_eq!(state.status, GameStatus::Idle);
        assert_eq!(state.time_remaining, Some(180));
        assert_eq!((state.flag_count, state.revealed_count, state.move_count), (0, 0, 0));
        assert!(state.first_click);
        assert_eq!(state.mode_id, "time-attack");
    }

    #[test]
    fn default_win_needs_every_safe_cell() {
        let manager = manager(classic());
        let mut state = started_state(&manager, 0);

        state.revealed_count = 215;
        assert!(!manager.check_win_condition(&state));
        state.revealed_count = 216;
        assert!(manager.check_win_condition(&state));
    }

    #[test]
    fn custom_predicates_see_augmented_view() {
        let mut mode = classic();
        mode.rules.win_condition = Some(RulePredicate::new(|view| view.time_elapsed_ms >= 5_000));
        mode.rules.lose_condition = Some(RulePredicate::new(|view| view.hit_mine && view.width == 16));
        let manager = manager(mode);

        let state = started_state(&manager, 6_000);
        assert!(manager.check_win_condition(&state));
        assert!(manager.check_lose_condition(&state, true));
        assert!(!manager.check_lose_condition(&state, false));
        assert!(!manager.check_win_condition(&started_state(&manager, 1_000)));
    }

    #[test]
    fn zen_mine_hit_does_not_lose() {
        let manager = manager(zen());
        let state = started_state(&manager, 0);

        assert!(!manager.check_lose_condition(&state, true));
        assert!(ModeManager::with_clock(classic(), ManualClock::new(0)).check_lose_condition(&state, true));
    }

    #[test]
    fn time_and_move_limits_lose() {
        let timed = manager(time_attack());
        let mut state = started_state(&timed, 0);
        assert!(!timed.check_lose_condition(&state, false));
        state.time_remaining = Some(0);
        assert!(timed.check_lose_condition(&state, false));

        let limited = manager(limited_moves());
        let mut state = started_state(&limited, 0);
        state.move_count = 29;
        assert!(!limited.check_lose_condition(&state, false));
        state.move_count = 30;
        assert!(limited.check_lose_condition(&state, false));
    }

    #[test]
    fn blind_mode_reveals_only_near_flags() {
        let manager = manager(blind());
        let mut state = started_state(&manager, 0);
        state.board.toggle_flag((5, 5)).unwrap();

        assert!(manager.should_reveal_cell(&state.board[(6, 6)], &state));
        assert!(!manager.should_reveal_cell(&state.board[(5, 5)], &state));
        assert!(!manager.should_reveal_cell(&state.board[(0, 0)], &state));

        let open = ModeManager::with_clock(classic(), ManualClock::new(0));
        assert!(open.should_reveal_cell(&state.board[(0, 0)], &state));
    }

    #[test]
    fn continue_cost_orders_multiplier_level_then_discount() {
        let manager = manager(survival());
        let mut state = started_state(&manager, 10_000);
        state.level = 3;

        // 150 + 30, discounted
        assert_eq!(manager.continue_cost(&state), 144);

        state.continue_count = 2;
        // 150 * 2.25 + 30, discounted
        assert_eq!(manager.continue_cost(&state), 294);

        let late = started_state(&manager, 45_000);
        assert_eq!(manager.continue_cost(&late), 160);
    }

    #[test]
    fn continue_cost_grows_with_each_purchase() {
        let manager = manager(time_attack());
        let mut state = started_state(&manager, 60_000);

        let mut last = 0;
        for count in 0..8 {
            state.continue_count = count;
            let cost = manager.continue_cost(&state);
            assert!(cost >= last);
            last = cost;
        }
        state.continue_count = 0;
        assert_eq!(manager.continue_cost(&state), 100);
    }

    #[test]
    fn continue_benefits_follow_mode_declaration() {
        let limited = manager(limited_moves());
        let mut state = started_state(&limited, 0);
        state.status = GameStatus::Lost;
        state.move_count = 30;
        limited.apply_continue(&mut state);
        assert_eq!(state.move_count, 20);
        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.continue_timestamps, vec![100_000]);

        state.move_count = 4;
        limited.apply_continue(&mut state);
        assert_eq!(state.move_count, 0);
        assert_eq!(state.continue_count, 2);

        let timed = manager(time_attack());
        let mut state = started_state(&timed, 0);
        state.time_remaining = Some(0);
        timed.apply_continue(&mut state);
        assert_eq!(state.time_remaining, Some(60));

        let rounds = manager(timed_rounds());
        let mut state = started_state(&rounds, 0);
        state.time_remaining = Some(-3);
        rounds.apply_continue(&mut state);
        assert_eq!(state.time_remaining, Some(60));

        let plain = manager(progressive());
        let mut state = started_state(&plain, 0);
        state.status = GameStatus::Lost;
        plain.apply_continue(&mut state);
        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.time_remaining, None);
    }

    #[test]
    fn accessors_read_through_definition() {
        let memory = manager(memory());
        assert!(memory.has_custom_game_flow());
        assert_eq!(
            memory.game_flow_phases(),
            &[FlowPhase::Reveal, FlowPhase::Memorize, FlowPhase::Play]
        );
        assert_eq!(memory.special_rules(), &["memorize-board".to_owned()]);

        let classic = manager(classic());
        assert!(!classic.has_custom_game_flow());
        assert!(classic.game_flow_phases().is_empty());
        assert!(!classic.is_progressive_mode());
        assert!(!classic.is_timed_mode());
        assert!(!classic.can_continue());
        assert_eq!((classic.id(), classic.name()), ("classic", "Classic"));

        assert!(manager(limited_moves()).has_move_limit());
        assert!(manager(survival()).is_progressive_mode());
        assert_eq!(manager(survival()).category(), ModeCategory::Progression);
    }
}
