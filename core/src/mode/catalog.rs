use serde::Deserialize;

use super::*;

fn fixed(width: Coord, height: Coord, mines: CellCount) -> ModeConfig {
    ModeConfig {
        board_size: BoardSize::Fixed { width, height },
        mine_count: MineCount::Fixed(mines),
        ..Default::default()
    }
}

fn tags(rules: &[&str]) -> Vec<String> {
    rules.iter().map(|rule| (*rule).to_owned()).collect()
}

fn describe(mut mode: ModeDefinition, icon: &str, description: &str) -> ModeDefinition {
    mode.icon = icon.to_owned();
    mode.description = description.to_owned();
    mode
}

pub fn classic() -> ModeDefinition {
    let mut mode = ModeDefinition::new("classic", "Classic", ModeCategory::Classic);
    mode.config = fixed(16, 16, 40);
    mode.scoring = ScoringRules {
        base_points: Some(1000.0),
        time_bonus: Some(Curve::linear(1000.0, -5.0).at_least(0.0)),
        accuracy_bonus: Some(Curve::linear(0.0, 500.0)),
        perfect_bonus: Some(500.0),
        ..Default::default()
    };
    describe(mode, "💣", "Clear the board without hitting a mine.")
}

pub fn time_attack() -> ModeDefinition {
    let mut mode = ModeDefinition::new("time-attack", "Time Attack", ModeCategory::Timed);
    mode.config = ModeConfig {
        time_limit: Some(180),
        special_rules: tags(&["countdown"]),
        ..fixed(16, 16, 40)
    };
    mode.scoring = ScoringRules {
        base_points: Some(1000.0),
        time_bonus: Some(Curve::linear(1500.0, -8.0).at_least(0.0)),
        accuracy_bonus: Some(Curve::linear(0.0, 500.0)),
        ..Default::default()
    };
    mode.continues = ContinuePolicy {
        allowed: true,
        base_cost: 100,
        benefit: ContinueBenefit::AddTime(60),
    };
    describe(mode, "⏱", "Beat the clock.")
}

pub fn survival() -> ModeDefinition {
    let mut mode = ModeDefinition::new("survival", "Survival", ModeCategory::Progression);
    mode.config = ModeConfig {
        board_size: BoardSize::Dynamic,
        mine_count: MineCount::Dynamic,
        time_limit: Some(300),
        special_rules: tags(&["countdown", "endless"]),
        difficulty_progression: Some(Progression {
            resolver: LevelResolver::Linear(LinearProgression {
                width: 9,
                height: 9,
                mines: 10,
                width_step: 1,
                height_step: 1,
                mine_step: 5,
                max_width: 30,
                max_height: 24,
                time_limit: Some(300),
                time_step: -15,
            }),
            max_level: None,
        }),
        ..Default::default()
    };
    mode.scoring = ScoringRules {
        base_points: Some(500.0),
        level_multiplier: Some(Curve::linear(0.0, 250.0)),
        survival_bonus: Some(SurvivalBonus {
            per_level: 500.0,
            per_second: 10.0,
        }),
        ..Default::default()
    };
    mode.continues = ContinuePolicy {
        allowed: true,
        base_cost: 150,
        benefit: ContinueBenefit::AddTime(60),
    };
    describe(mode, "🛡", "Boards grow and the clock shrinks every level.")
}

pub fn zen() -> ModeDefinition {
    let mut mode = ModeDefinition::new("zen", "Zen", ModeCategory::Special);
    mode.config = ModeConfig {
        special_rules: tags(&["no-game-over"]),
        ..fixed(16, 16, 40)
    };
    mode.rules.reveal_on_mine_click = false;
    mode.scoring = ScoringRules {
        base_points: Some(500.0),
        accuracy_bonus: Some(Curve::linear(0.0, 1000.0)),
        ..Default::default()
    };
    describe(mode, "🍃", "Mines are mistakes, not the end.")
}

pub fn blind() -> ModeDefinition {
    let mut mode = ModeDefinition::new("blind", "Blind", ModeCategory::Challenge);
    mode.config = ModeConfig {
        special_rules: tags(&["hidden-numbers"]),
        ..fixed(12, 12, 20)
    };
    mode.rules.number_visibility = NumberVisibility::Conditional;
    mode.scoring = ScoringRules {
        base_points: Some(1500.0),
        blind_bonus: Some(2000.0),
        deduction_points: Some(Curve::linear(0.0, 50.0)),
        ..Default::default()
    };
    describe(mode, "🕶", "Numbers only show next to your flags.")
}

pub fn memory() -> ModeDefinition {
    let mut mode = ModeDefinition::new("memory", "Memory", ModeCategory::Special);
    mode.config = ModeConfig {
        special_rules: tags(&["memorize-board"]),
        ..fixed(10, 10, 15)
    };
    mode.rules.game_flow = Some(GameFlow {
        phases: vec![FlowPhase::Reveal, FlowPhase::Memorize, FlowPhase::Play],
        reveal_duration_ms: 5_000,
    });
    mode.scoring = ScoringRules {
        base_points: Some(1000.0),
        memory_accuracy: Some(Curve::linear(0.0, 20.0)),
        speed_recall_bonus: Some(Curve::linear(2000.0, -20.0).at_least(0.0)),
        pattern_recognition: Some(Curve::linear(0.0, 1000.0)),
        ..Default::default()
    };
    describe(mode, "🧠", "Study the board, then play it from memory.")
}

pub fn limited_moves() -> ModeDefinition {
    let mut mode = ModeDefinition::new("limited-moves", "Limited Moves", ModeCategory::Challenge);
    mode.config = ModeConfig {
        move_limit: Some(30),
        special_rules: tags(&["move-budget"]),
        ..fixed(9, 9, 10)
    };
    mode.scoring = ScoringRules {
        base_points: Some(800.0),
        efficiency_bonus: Some(Curve::linear(0.0, 100.0)),
        ..Default::default()
    };
    mode.continues = ContinuePolicy {
        allowed: true,
        base_cost: 100,
        benefit: ContinueBenefit::RefundMoves(10),
    };
    describe(mode, "👣", "Every click counts.")
}

pub fn timed_rounds() -> ModeDefinition {
    let mut mode = ModeDefinition::new("timed-rounds", "Timed Rounds", ModeCategory::Timed);
    mode.config = ModeConfig {
        time_limit: Some(60),
        special_rules: tags(&["countdown", "rounds"]),
        ..fixed(9, 9, 10)
    };
    mode.scoring = ScoringRules {
        base_points: Some(500.0),
        round_bonus: Some(Curve::linear(0.0, 200.0)),
        speed_multiplier: Some(Curve::linear(1.0, 0.1)),
        ..Default::default()
    };
    mode.continues = ContinuePolicy {
        allowed: true,
        base_cost: 80,
        benefit: ContinueBenefit::ResetTime,
    };
    describe(mode, "⌛", "A fresh minute for every board.")
}

pub fn multi_round() -> ModeDefinition {
    let mut mode = ModeDefinition::new("multi-round", "Multi-Round", ModeCategory::Challenge);
    mode.config = ModeConfig {
        special_rules: tags(&["rounds"]),
        ..fixed(9, 9, 10)
    };
    mode.scoring = ScoringRules {
        base_points: Some(500.0),
        round_bonus: Some(Curve::linear(0.0, 300.0)),
        combo_multiplier: Some(Curve::linear(1.0, 0.25)),
        streak_bonus: Some(Curve::linear(0.0, 100.0)),
        ..Default::default()
    };
    describe(mode, "🔁", "Win boards back to back to build a combo.")
}

pub fn progressive() -> ModeDefinition {
    let mut mode = ModeDefinition::new("progressive", "Progressive", ModeCategory::Progression);
    mode.config = ModeConfig {
        board_size: BoardSize::Dynamic,
        mine_count: MineCount::Dynamic,
        difficulty_progression: Some(Progression {
            resolver: LevelResolver::Linear(LinearProgression {
                width: 8,
                height: 8,
                mines: 8,
                width_step: 2,
                height_step: 2,
                mine_step: 6,
                max_width: 24,
                max_height: 24,
                time_limit: None,
                time_step: 0,
            }),
            max_level: Some(10),
        }),
        ..Default::default()
    };
    mode.scoring = ScoringRules {
        base_points: Some(1000.0),
        level_multiplier: Some(Curve::linear(0.0, 500.0)),
        time_bonus: Some(Curve::linear(600.0, -2.0).at_least(0.0)),
        ..Default::default()
    };
    mode.continues = ContinuePolicy {
        allowed: true,
        base_cost: 200,
        benefit: ContinueBenefit::None,
    };
    describe(mode, "📈", "Ten levels, each one bigger.")
}

pub fn speed_run() -> ModeDefinition {
    let mut mode = ModeDefinition::new("speed-run", "Speed Run", ModeCategory::Timed);
    mode.config = fixed(9, 9, 10);
    mode.scoring = ScoringRules {
        time_based_score: Some(Curve::linear(10_000.0, -100.0).at_least(0.0)),
        ..Default::default()
    };
    describe(mode, "⚡", "Score is all about speed.")
}

pub fn hardcore() -> ModeDefinition {
    let mut mode = ModeDefinition::new("hardcore", "Hardcore", ModeCategory::Challenge);
    mode.config = ModeConfig {
        special_rules: tags(&["unsafe-start"]),
        ..fixed(30, 16, 99)
    };
    mode.rules.first_click_safe = false;
    mode.scoring = ScoringRules {
        base_points: Some(2000.0),
        perfect_bonus: Some(2000.0),
        hardcore_multiplier: Some(2.0),
        flawless_bonus: Some(5000.0),
        ..Default::default()
    };
    describe(mode, "💀", "Expert board, no safe first click.")
}

pub fn custom() -> ModeDefinition {
    let mut mode = ModeDefinition::new("custom", "Custom", ModeCategory::Custom);
    mode.config = fixed(16, 16, 40);
    mode.scoring = ScoringRules {
        base_points: Some(500.0),
        accuracy_bonus: Some(Curve::linear(0.0, 250.0)),
        ..Default::default()
    };
    describe(mode, "🛠", "Your board, your rules.")
}

pub fn builtin_modes() -> Vec<ModeDefinition> {
    vec![
        classic(),
        time_attack(),
        survival(),
        zen(),
        blind(),
        memory(),
        limited_moves(),
        timed_rounds(),
        multi_round(),
        progressive(),
        speed_run(),
        hardcore(),
        custom(),
    ]
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    modes: Vec<ModeDefinition>,
}

/// Ordered set of mode definitions keyed by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModeCatalog {
    modes: Vec<ModeDefinition>,
}

impl ModeCatalog {
    pub fn builtin() -> Self {
        Self {
            modes: builtin_modes(),
        }
    }

    /// Parses `[[modes]]` tables. Hooks cannot come from configuration and
    /// must be attached afterwards.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(source).map_err(|err| RulesError::Config(err.to_string()))?;

        let mut catalog = Self::default();
        for mode in file.modes {
            if mode.id.is_empty() {
                return Err(RulesError::Config("mode without id".to_owned()));
            }
            if catalog.get(&mode.id).is_some() {
                return Err(RulesError::Config(format!("duplicate mode id {:?}", mode.id)));
            }
            catalog.modes.push(mode);
        }
        log::debug!("Loaded {} modes from configuration", catalog.modes.len());
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&ModeDefinition> {
        self.modes.iter().find(|mode| mode.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modes.iter().map(|mode| mode.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModeDefinition> {
        self.modes.iter()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Adds a mode, replacing any existing mode with the same id.
    pub fn insert(&mut self, mode: ModeDefinition) {
        match self.modes.iter_mut().find(|existing| existing.id == mode.id) {
            Some(existing) => *existing = mode,
            None => self.modes.push(mode),
        }
    }

    pub fn merge(&mut self, other: ModeCatalog) {
        for mode in other.modes {
            self.insert(mode);
        }
    }
}
