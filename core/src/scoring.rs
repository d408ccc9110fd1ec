//! Folds a finished game into a score.
//!
//! Every function here is pure: the same inputs always give the same score.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::*;

/// Inputs of [`calculate_score`].
#[derive(Copy, Clone, Debug)]
pub struct ScoreContext<'a> {
    pub state: &'a GameState,
    pub mode: &'a ModeDefinition,
    pub time_elapsed_ms: u64,
    /// Flag accuracy in `[0, 1]`.
    pub accuracy: f64,
    pub perfect_game: bool,
}

impl<'a> ScoreContext<'a> {
    /// Context with accuracy and perfect-game derived from the state.
    pub fn new(state: &'a GameState, mode: &'a ModeDefinition, time_elapsed_ms: u64) -> Self {
        Self {
            state,
            mode,
            time_elapsed_ms,
            accuracy: calculate_accuracy(state),
            perfect_game: is_perfect_game(state),
        }
    }
}

/// Applies every formula the mode declares, in a fixed order.
///
/// Multipliers scale whatever has accumulated before them, so the order below
/// is part of the result.
pub fn calculate_score(ctx: &ScoreContext<'_>) -> i64 {
    let scoring = &ctx.mode.scoring;
    let state = ctx.state;
    let secs = ctx.time_elapsed_ms as f64 / 1000.0;
    let round = f64::from(state.round);
    let streak = f64::from(state.streak);
    let level = f64::from(state.level);

    let mut score = 0.0;

    if let Some(base) = scoring.base_points {
        score += base;
    }
    if let Some(bonus) = &scoring.time_bonus {
        score += bonus.eval(secs);
    }
    if let Some(bonus) = &scoring.accuracy_bonus {
        score += bonus.eval(ctx.accuracy);
    }
    if let Some(speed) = &scoring.time_based_score {
        score += speed.eval(secs);
    }
    if let Some(bonus) = &scoring.round_bonus {
        score += bonus.eval(round);
    }
    if let Some(multiplier) = &scoring.speed_multiplier {
        score *= multiplier.eval(round);
    }
    if let Some(multiplier) = &scoring.combo_multiplier {
        score *= multiplier.eval(streak);
    }
    if let Some(bonus) = &scoring.level_multiplier {
        score += bonus.eval(level);
    }
    if let Some(bonus) = &scoring.streak_bonus {
        score += bonus.eval(streak);
    }
    if let Some(bonus) = &scoring.survival_bonus {
        score += bonus.eval(state.level, state.time_remaining.unwrap_or(0));
    }
    if let (Some(bonus), Some(limit)) = (&scoring.efficiency_bonus, ctx.mode.config.move_limit) {
        score += bonus.eval(f64::from(limit.saturating_sub(state.move_count)));
    }
    if let Some(bonus) = scoring.perfect_bonus.filter(|_| ctx.perfect_game) {
        score += bonus;
    }
    if let Some(multiplier) = scoring.hardcore_multiplier {
        score *= multiplier;
    }
    if let Some(bonus) = scoring
        .flawless_bonus
        .filter(|_| state.continue_count == 0 && ctx.perfect_game)
    {
        score += bonus;
    }
    if let Some(bonus) = scoring.blind_bonus {
        score += bonus;
    }
    if let Some(points) = &scoring.deduction_points {
        score += points.eval(f64::from(count_correct_flags(state)));
    }
    // revealed safe cells stand in for correct recalls
    if let Some(bonus) = &scoring.memory_accuracy {
        score += bonus.eval(f64::from(state.board.count_revealed_safe()));
    }
    if let Some(bonus) = &scoring.speed_recall_bonus {
        score += bonus.eval(secs);
    }
    if let Some(bonus) = &scoring.pattern_recognition {
        score += bonus.eval(early_flag_accuracy(state));
    }
    if let Some(bonus) = scoring.symmetry_bonus {
        score += bonus;
    }
    if let Some(formula) = &scoring.custom_formula {
        score += formula.call(&CustomScoreInput {
            level: state.level,
            score,
            time: secs,
            accuracy: ctx.accuracy,
        });
    }

    score.floor() as i64
}

/// Flags sitting on mines.
pub fn count_correct_flags(state: &GameState) -> CellCount {
    state
        .board
        .cells()
        .filter(|cell| cell.is_flagged && cell.is_mine)
        .count() as CellCount
}

/// Share of flags that sit on mines, 1.0 when nothing is flagged.
pub fn calculate_accuracy(state: &GameState) -> f64 {
    let flags = state.board.count_flags();
    if flags == 0 {
        return 1.0;
    }
    f64::from(count_correct_flags(state)) / f64::from(flags)
}

/// Accuracy of flags placed early in the game.
///
/// Flags carry no placement time, so this is the overall flag accuracy.
pub fn early_flag_accuracy(state: &GameState) -> f64 {
    calculate_accuracy(state)
}

/// A win with no continues and no misplaced flag.
pub fn is_perfect_game(state: &GameState) -> bool {
    state.continue_count == 0
        && state.status == GameStatus::Won
        && state
            .board
            .cells()
            .filter(|cell| cell.is_flagged)
            .all(|cell| cell.is_mine)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScoreAction {
    /// `cells` counts the clicked cell plus anything it cascaded into.
    Reveal { cells: CellCount, adjacent_mines: u8 },
    Flag,
    Unflag,
    Combo { count: u32 },
}

/// Points for a single action, independent of the mode's formulas.
pub fn calculate_action_score(action: ScoreAction) -> i64 {
    match action {
        ScoreAction::Reveal {
            cells,
            adjacent_mines,
        } => 10 + 5 * i64::from(cells.saturating_sub(1)) + 2 * i64::from(adjacent_mines),
        ScoreAction::Flag => 15,
        ScoreAction::Unflag => 0,
        ScoreAction::Combo { count } => i64::from(count) * 50,
    }
}

/// Bonus for clearing a level: 1000 per level, plus 2000 under a minute or
/// 1000 under two, all doubled for a perfect game.
pub fn calculate_level_completion_bonus(level: u32, time_elapsed_ms: u64, perfect: bool) -> i64 {
    let mut bonus = i64::from(level) * 1000;

    if time_elapsed_ms < 60_000 {
        bonus += 2000;
    } else if time_elapsed_ms < 120_000 {
        bonus += 1000;
    }

    if perfect { bonus * 2 } else { bonus }
}

/// Groups thousands with commas.
pub fn format_score(score: i64) -> String {
    let digits = score.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if score < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoreRank {
    Novice,
    Intermediate,
    Advanced,
    Expert,
    Master,
    Legendary,
}

impl fmt::Display for ScoreRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ScoreRank::*;
        f.write_str(match self {
            Novice => "Novice",
            Intermediate => "Intermediate",
            Advanced => "Advanced",
            Expert => "Expert",
            Master => "Master",
            Legendary => "Legendary",
        })
    }
}

pub const fn get_score_rank(score: i64) -> ScoreRank {
    use ScoreRank::*;
    match score {
        100_000.. => Legendary,
        50_000.. => Master,
        25_000.. => Expert,
        10_000.. => Advanced,
        5_000.. => Intermediate,
        _ => Novice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(mines: &[Coord2], flags: &[Coord2]) -> GameState {
        let mut board = Board::empty(5, 5);
        board.set_mines(mines);
        for &pos in flags {
            board.toggle_flag(pos).unwrap();
        }
        let mut state = GameState::new(board, BoardConfig::new(5, 5, mines.len() as CellCount), "test");
        state.sync_counts();
        state
    }

    fn mode_with(scoring: ScoringRules) -> ModeDefinition {
        let mut mode = ModeDefinition::new("test", "Test", ModeCategory::Custom);
        mode.scoring = scoring;
        mode
    }

    #[test]
    fn combo_multiplier_scales_base_points() {
        let mode = mode_with(ScoringRules {
            base_points: Some(100.0),
            combo_multiplier: Some(Curve::linear(1.0, 0.1)),
            ..Default::default()
        });
        let mut state = state_with(&[], &[]);
        state.streak = 3;

        let ctx = ScoreContext::new(&state, &mode, 0);
        assert_eq!(calculate_score(&ctx), 130);
    }

    #[test]
    fn multipliers_only_scale_what_came_before() {
        let mode = mode_with(ScoringRules {
            base_points: Some(100.0),
            round_bonus: Some(Curve::linear(0.0, 50.0)),
            speed_multiplier: Some(Curve::constant(2.0)),
            level_multiplier: Some(Curve::linear(0.0, 10.0)),
            hardcore_multiplier: Some(3.0),
            blind_bonus: Some(7.0),
            ..Default::default()
        });
        let mut state = state_with(&[], &[]);
        state.round = 2;
        state.level = 4;

        // ((100 + 100) * 2 + 40) * 3 + 7
        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 0)), 1327);
    }

    #[test]
    fn perfect_and_flawless_need_a_clean_win() {
        let mode = mode_with(ScoringRules {
            perfect_bonus: Some(500.0),
            flawless_bonus: Some(1000.0),
            ..Default::default()
        });
        let mut state = state_with(&[(0, 0)], &[(0, 0)]);
        state.status = GameStatus::Won;
        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 0)), 1500);

        state.continue_count = 1;
        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 0)), 0);
    }

    #[test]
    fn state_dependent_bonuses() {
        let mut mode = mode_with(ScoringRules {
            survival_bonus: Some(SurvivalBonus {
                per_level: 100.0,
                per_second: 2.0,
            }),
            efficiency_bonus: Some(Curve::linear(0.0, 10.0)),
            deduction_points: Some(Curve::linear(0.0, 25.0)),
            memory_accuracy: Some(Curve::linear(0.0, 1.0)),
            ..Default::default()
        });
        mode.config.move_limit = Some(20);

        let mut state = state_with(&[(0, 0), (1, 1)], &[(0, 0), (4, 4)]);
        state.level = 2;
        state.time_remaining = Some(30);
        state.move_count = 12;
        for pos in [(0, 2), (1, 2), (2, 2), (3, 2), (4, 2), (0, 3), (1, 3), (2, 3), (3, 3)] {
            state.board.reveal_cell(pos, false).unwrap();
        }
        state.sync_counts();

        // 200 + 60, 8 moves left, one good flag, nine reveals
        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 0)), 260 + 80 + 25 + 9);
    }

    #[test]
    fn memory_score_ignores_mines_shown_after_a_loss() {
        let mode = mode_with(ScoringRules {
            memory_accuracy: Some(Curve::linear(0.0, 10.0)),
            ..Default::default()
        });
        let mut state = state_with(&[(0, 0), (4, 4)], &[]);
        state.board.reveal_cell((2, 2), false).unwrap();
        state.sync_counts();
        let before = calculate_score(&ScoreContext::new(&state, &mode, 0));

        state.status = GameStatus::Lost;
        state.board.reveal_all_mines();
        state.sync_counts();

        assert_eq!(state.revealed_count, 3);
        assert_eq!(before, 10);
        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 0)), before);
    }

    #[test]
    fn efficiency_needs_move_limit() {
        let mode = mode_with(ScoringRules {
            efficiency_bonus: Some(Curve::constant(999.0)),
            ..Default::default()
        });

        assert_eq!(calculate_score(&ScoreContext::new(&state_with(&[], &[]), &mode, 0)), 0);
    }

    #[test]
    fn custom_formula_sees_running_total() {
        let mut mode = mode_with(ScoringRules {
            base_points: Some(40.0),
            symmetry_bonus: Some(10.0),
            ..Default::default()
        });
        mode.scoring.custom_formula = Some(CustomFormula::new(|input| input.score + input.time + f64::from(input.level)));
        let state = state_with(&[], &[]);

        // 50 + (50 + 2.5 + 1)
        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 2_500)), 103);
    }

    #[test]
    fn time_curves_use_seconds() {
        let mode = mode_with(ScoringRules {
            time_bonus: Some(Curve::linear(1000.0, -10.0).at_least(0.0)),
            speed_recall_bonus: Some(Curve::linear(100.0, -1.0)),
            ..Default::default()
        });
        let state = state_with(&[], &[]);

        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 30_000)), 700 + 70);
        assert_eq!(calculate_score(&ScoreContext::new(&state, &mode, 200_000)), -100);
    }

    #[test]
    fn score_is_deterministic() {
        let mode = memory();
        let mut state = state_with(&[(2, 2)], &[(2, 2), (0, 4)]);
        state.revealed_count = 12;
        let ctx = ScoreContext::new(&state, &mode, 42_000);

        let first = calculate_score(&ctx);
        for _ in 0..10 {
            assert_eq!(calculate_score(&ctx), first);
        }
    }

    #[test]
    fn accuracy_counts_flags_on_mines() {
        assert_eq!(calculate_accuracy(&state_with(&[(0, 0)], &[])), 1.0);
        assert_eq!(calculate_accuracy(&state_with(&[(0, 0)], &[(0, 0), (3, 3)])), 0.5);
        assert_eq!(calculate_accuracy(&state_with(&[(0, 0)], &[(3, 3)])), 0.0);
    }

    #[test]
    fn early_flag_accuracy_is_overall_accuracy() {
        // no placement times are tracked, so early and overall accuracy agree
        let state = state_with(&[(0, 0), (1, 0)], &[(0, 0), (4, 4), (1, 0)]);

        assert_eq!(early_flag_accuracy(&state), calculate_accuracy(&state));
    }

    #[test]
    fn perfect_game_rules() {
        let mut state = state_with(&[(0, 0)], &[(0, 0)]);
        assert!(!is_perfect_game(&state));

        state.status = GameStatus::Won;
        assert!(is_perfect_game(&state));

        state.continue_count = 1;
        assert!(!is_perfect_game(&state));

        let mut misflagged = state_with(&[(0, 0)], &[(1, 1)]);
        misflagged.status = GameStatus::Won;
        assert!(!is_perfect_game(&misflagged));
    }

    #[test]
    fn action_scores() {
        assert_eq!(
            calculate_action_score(ScoreAction::Reveal {
                cells: 1,
                adjacent_mines: 3
            }),
            16
        );
        assert_eq!(
            calculate_action_score(ScoreAction::Reveal {
                cells: 11,
                adjacent_mines: 0
            }),
            60
        );
        assert_eq!(calculate_action_score(ScoreAction::Flag), 15);
        assert_eq!(calculate_action_score(ScoreAction::Unflag), 0);
        assert_eq!(calculate_action_score(ScoreAction::Combo { count: 4 }), 200);
    }

    #[test]
    fn level_completion_bonus_bands() {
        assert_eq!(calculate_level_completion_bonus(3, 45_000, false), 5000);
        assert_eq!(calculate_level_completion_bonus(3, 90_000, false), 4000);
        assert_eq!(calculate_level_completion_bonus(3, 300_000, false), 3000);
        assert_eq!(calculate_level_completion_bonus(3, 45_000, true), 10000);
    }

    #[test]
    fn score_formatting_and_ranks() {
        assert_eq!(format_score(0), "0");
        assert_eq!(format_score(999), "999");
        assert_eq!(format_score(1234567), "1,234,567");
        assert_eq!(format_score(-12000), "-12,000");

        assert_eq!(get_score_rank(150_000), ScoreRank::Legendary);
        assert_eq!(get_score_rank(50_000), ScoreRank::Master);
        assert_eq!(get_score_rank(30_000), ScoreRank::Expert);
        assert_eq!(get_score_rank(10_000), ScoreRank::Advanced);
        assert_eq!(get_score_rank(5_000), ScoreRank::Intermediate);
        assert_eq!(get_score_rank(4_999), ScoreRank::Novice);
        assert_eq!(ScoreRank::Legendary.to_string(), "Legendary");
    }
}
