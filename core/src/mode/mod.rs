//! Declarative description of a game mode.
//!
//! A definition is built once, from code or from configuration, and then only
//! read. Mode-specific behaviour is declared here as data or hooks instead of
//! being switched on by id.

use serde::{Deserialize, Serialize};

use crate::*;

pub use catalog::*;
pub use hooks::*;

mod catalog;
mod hooks;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeCategory {
    #[default]
    Classic,
    Timed,
    Challenge,
    Progression,
    Special,
    Custom,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardSize {
    Fixed { width: Coord, height: Coord },
    /// Sized per level by the mode's progression.
    Dynamic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MineCount {
    Fixed(CellCount),
    Dynamic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub resolver: LevelResolver,
    #[serde(default)]
    pub max_level: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub board_size: BoardSize,
    pub mine_count: MineCount,
    /// Seconds.
    pub time_limit: Option<u32>,
    pub move_limit: Option<u32>,
    pub special_rules: Vec<String>,
    pub difficulty_progression: Option<Progression>,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            board_size: BoardSize::Fixed {
                width: 16,
                height: 16,
            },
            mine_count: MineCount::Fixed(40),
            time_limit: None,
            move_limit: None,
            special_rules: Vec::new(),
            difficulty_progression: None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberVisibility {
    #[default]
    Always,
    /// Numbers show only next to flags (blind play).
    Conditional,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    Reveal,
    Memorize,
    Play,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFlow {
    pub phases: Vec<FlowPhase>,
    /// How long the memorize countdown runs, in milliseconds.
    #[serde(default = "GameFlow::default_reveal_duration")]
    pub reveal_duration_ms: u64,
}

impl GameFlow {
    const fn default_reveal_duration() -> u64 {
        5_000
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeRules {
    pub cascade_reveal: bool,
    pub first_click_safe: bool,
    pub allow_flags: bool,
    pub number_visibility: NumberVisibility,
    /// Whether hitting a mine ends the game.
    pub reveal_on_mine_click: bool,
    #[serde(skip)]
    pub win_condition: Option<RulePredicate>,
    #[serde(skip)]
    pub lose_condition: Option<RulePredicate>,
    pub game_flow: Option<GameFlow>,
}

impl Default for ModeRules {
    fn default() -> Self {
        Self {
            cascade_reveal: true,
            first_click_safe: true,
            allow_flags: true,
            number_visibility: NumberVisibility::Always,
            reveal_on_mine_click: true,
            win_condition: None,
            lose_condition: None,
            game_flow: None,
        }
    }
}

/// Additive bonus linear in level and seconds left.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalBonus {
    pub per_level: f64,
    pub per_second: f64,
}

impl SurvivalBonus {
    pub fn eval(&self, level: u32, time_remaining: i64) -> f64 {
        self.per_level * f64::from(level) + self.per_second * time_remaining as f64
    }
}

/// Sparse set of scoring formulas. See [`calculate_score`] for the order in
/// which they apply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub base_points: Option<f64>,
    /// Of elapsed seconds.
    pub time_bonus: Option<Curve>,
    /// Of flag accuracy in `[0, 1]`.
    pub accuracy_bonus: Option<Curve>,
    /// Of elapsed seconds.
    pub time_based_score: Option<Curve>,
    /// Of round number.
    pub round_bonus: Option<Curve>,
    /// Of round number, multiplies the running total.
    pub speed_multiplier: Option<Curve>,
    /// Of win streak, multiplies the running total.
    pub combo_multiplier: Option<Curve>,
    /// Of level.
    pub level_multiplier: Option<Curve>,
    /// Of win streak.
    pub streak_bonus: Option<Curve>,
    pub survival_bonus: Option<SurvivalBonus>,
    /// Of moves left under the move limit.
    pub efficiency_bonus: Option<Curve>,
    pub perfect_bonus: Option<f64>,
    pub hardcore_multiplier: Option<f64>,
    pub flawless_bonus: Option<f64>,
    pub blind_bonus: Option<f64>,
    /// Of correctly flagged mines.
    pub deduction_points: Option<Curve>,
    /// Of revealed cells.
    pub memory_accuracy: Option<Curve>,
    /// Of elapsed seconds.
    pub speed_recall_bonus: Option<Curve>,
    /// Of early flag accuracy.
    pub pattern_recognition: Option<Curve>,
    pub symmetry_bonus: Option<f64>,
    #[serde(skip)]
    pub custom_formula: Option<CustomFormula>,
}

/// What a purchased continue gives back besides resuming play.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinueBenefit {
    #[default]
    None,
    /// Takes this many moves off the move counter.
    RefundMoves(u32),
    /// Adds seconds to the remaining time.
    AddTime(u32),
    /// Restarts the clock at the mode's time limit, or 60 seconds.
    ResetTime,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuePolicy {
    pub allowed: bool,
    pub base_cost: u32,
    pub benefit: ContinueBenefit,
}

impl Default for ContinuePolicy {
    fn default() -> Self {
        Self {
            allowed: false,
            base_cost: 100,
            benefit: ContinueBenefit::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: ModeCategory,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: ModeConfig,
    #[serde(default)]
    pub rules: ModeRules,
    #[serde(default)]
    pub scoring: ScoringRules,
    #[serde(default)]
    pub continues: ContinuePolicy,
}

impl ModeDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ModeCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            icon: String::new(),
            description: String::new(),
            config: ModeConfig::default(),
            rules: ModeRules::default(),
            scoring: ScoringRules::default(),
            continues: ContinuePolicy::default(),
        }
    }
}
