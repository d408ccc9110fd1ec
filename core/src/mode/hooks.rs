//! Strategy hooks attached to a [`ModeDefinition`](super::ModeDefinition).
//!
//! Each hook is either a data form that can come from configuration or a
//! closure attached in code. Closures never serialize.

use alloc::sync::Arc;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::*;

/// Shared, immutable closure behind a mode hook.
pub struct Hook<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

impl<F: ?Sized> PartialEq for Hook<F> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub type CurveFn = Hook<dyn Fn(f64) -> f64 + Send + Sync>;
pub type RulePredicate = Hook<dyn Fn(&RuleView<'_>) -> bool + Send + Sync>;
pub type LevelFn = Hook<dyn Fn(u32) -> LevelSpec + Send + Sync>;
pub type CustomFormula = Hook<dyn Fn(&CustomScoreInput) -> f64 + Send + Sync>;

impl Hook<dyn Fn(f64) -> f64 + Send + Sync> {
    pub fn new(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, x: f64) -> f64 {
        (self.0)(x)
    }
}

impl Hook<dyn Fn(&RuleView<'_>) -> bool + Send + Sync> {
    pub fn new(f: impl Fn(&RuleView<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, view: &RuleView<'_>) -> bool {
        (self.0)(view)
    }
}

impl Hook<dyn Fn(u32) -> LevelSpec + Send + Sync> {
    pub fn new(f: impl Fn(u32) -> LevelSpec + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, level: u32) -> LevelSpec {
        (self.0)(level)
    }
}

impl Hook<dyn Fn(&CustomScoreInput) -> f64 + Send + Sync> {
    pub fn new(f: impl Fn(&CustomScoreInput) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, input: &CustomScoreInput) -> f64 {
        (self.0)(input)
    }
}

/// A one-argument scoring formula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    Constant {
        value: f64,
    },
    /// `intercept + slope * x`, optionally clamped.
    Linear {
        intercept: f64,
        slope: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    #[serde(skip)]
    Custom(CurveFn),
}

impl Curve {
    pub const fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    pub const fn linear(intercept: f64, slope: f64) -> Self {
        Self::Linear {
            intercept,
            slope,
            min: None,
            max: None,
        }
    }

    pub fn custom(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(CurveFn::new(f))
    }

    /// Clamps a linear curve from below; other curves are returned unchanged.
    pub fn at_least(self, floor: f64) -> Self {
        match self {
            Self::Linear {
                intercept,
                slope,
                max,
                ..
            } => Self::Linear {
                intercept,
                slope,
                min: Some(floor),
                max,
            },
            other => other,
        }
    }

    /// Clamps a linear curve from above; other curves are returned unchanged.
    pub fn at_most(self, ceiling: f64) -> Self {
        match self {
            Self::Linear {
                intercept,
                slope,
                min,
                ..
            } => Self::Linear {
                intercept,
                slope,
                min,
                max: Some(ceiling),
            },
            other => other,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Self::Constant { value } => *value,
            Self::Linear {
                intercept,
                slope,
                min,
                max,
            } => {
                let mut y = intercept + slope * x;
                if let Some(min) = min {
                    y = y.max(*min);
                }
                if let Some(max) = max {
                    y = y.min(*max);
                }
                y
            }
            Self::Custom(f) => f.call(x),
        }
    }
}

/// Read-only view handed to custom win/lose predicates.
#[derive(Copy, Clone, Debug)]
pub struct RuleView<'a> {
    pub state: &'a GameState,
    pub hit_mine: bool,
    pub game_over: bool,
    pub time_elapsed_ms: u64,
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

/// Input of a mode's custom score formula. `score` is the running total
/// before the formula is applied.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CustomScoreInput {
    pub level: u32,
    pub score: f64,
    pub time: f64,
    pub accuracy: f64,
}

/// Board parameters for one level; missing fields fall back to defaults.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSpec {
    pub width: Option<Coord>,
    pub height: Option<Coord>,
    pub mines: Option<CellCount>,
    pub time_limit: Option<u32>,
}

/// Board growth per level, starting from the level-1 values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearProgression {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
    pub width_step: Coord,
    pub height_step: Coord,
    pub mine_step: CellCount,
    pub max_width: Coord,
    pub max_height: Coord,
    pub time_limit: Option<u32>,
    /// Seconds added per level, negative to tighten the clock.
    pub time_step: i32,
}

impl Default for LinearProgression {
    fn default() -> Self {
        Self {
            width: 9,
            height: 9,
            mines: 10,
            width_step: 0,
            height_step: 0,
            mine_step: 0,
            max_width: 30,
            max_height: 24,
            time_limit: None,
            time_step: 0,
        }
    }
}

impl LinearProgression {
    pub fn at(&self, level: u32) -> LevelSpec {
        let steps = level.saturating_sub(1);
        let grow = |base: Coord, step: Coord, cap: Coord| -> Coord {
            let grown = u32::from(base).saturating_add(u32::from(step).saturating_mul(steps));
            grown.min(u32::from(cap.max(base))) as Coord
        };
        let mines = u32::from(self.mines).saturating_add(u32::from(self.mine_step).saturating_mul(steps));
        let time_limit = self.time_limit.map(|limit| {
            let shifted = i64::from(limit) + i64::from(self.time_step) * i64::from(steps);
            shifted.clamp(1, i64::from(u32::MAX)) as u32
        });

        LevelSpec {
            width: Some(grow(self.width, self.width_step, self.max_width)),
            height: Some(grow(self.height, self.height_step, self.max_height)),
            mines: Some(mines.min(u32::from(CellCount::MAX)) as CellCount),
            time_limit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelResolver {
    Linear(LinearProgression),
    #[serde(skip)]
    Custom(LevelFn),
}

impl LevelResolver {
    pub fn custom(f: impl Fn(u32) -> LevelSpec + Send + Sync + 'static) -> Self {
        Self::Custom(LevelFn::new(f))
    }

    pub fn resolve(&self, level: u32) -> LevelSpec {
        match self {
            Self::Linear(progression) => progression.at(level),
            Self::Custom(f) => f.call(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_clamps() {
        let curve = Curve::linear(1000.0, -10.0).at_least(0.0);

        assert_eq!(curve.eval(30.0), 700.0);
        assert_eq!(curve.eval(500.0), 0.0);
        assert_eq!(Curve::linear(0.0, 2.0).at_most(5.0).eval(10.0), 5.0);
    }

    #[test]
    fn custom_curve_calls_closure() {
        let curve = Curve::custom(|x| x * x);

        assert_eq!(curve.eval(3.0), 9.0);
        assert_eq!(curve.clone(), curve);
    }

    #[test]
    fn linear_progression_grows_and_caps() {
        let progression = LinearProgression {
            width: 8,
            height: 8,
            mines: 10,
            width_step: 2,
            height_step: 2,
            mine_step: 5,
            max_width: 12,
            max_height: 12,
            time_limit: Some(120),
            time_step: -10,
        };

        let first = progression.at(1);
        assert_eq!((first.width, first.height, first.mines), (Some(8), Some(8), Some(10)));
        assert_eq!(first.time_limit, Some(120));

        let fifth = progression.at(5);
        assert_eq!((fifth.width, fifth.height, fifth.mines), (Some(12), Some(12), Some(30)));
        assert_eq!(fifth.time_limit, Some(80));
        assert_eq!(progression.at(50).time_limit, Some(1));
    }

    #[test]
    fn curves_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            curve: Curve,
        }

        let parsed: Wrapper =
            toml::from_str("curve = { kind = \"linear\", intercept = 5.0, slope = 1.5 }").unwrap();

        assert_eq!(parsed.curve, Curve::linear(5.0, 1.5));
    }
}
