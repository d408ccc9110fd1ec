use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Won,
    Lost,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round: u32,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub score: i64,
    /// `None` while the round is being played.
    pub outcome: Option<RoundOutcome>,
    pub time_elapsed_ms: u64,
    pub moves_used: u32,
}

impl RoundData {
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiRoundState {
    pub current_round: u32,
    pub total_rounds: u32,
    pub rounds: Vec<RoundData>,
    pub total_score: i64,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
}

/// Sequences the rounds of a multi-round session and keeps the streaks.
#[derive(Clone, Debug)]
pub struct MultiRoundManager<C = SystemClock> {
    state: MultiRoundState,
    clock: C,
}

impl MultiRoundManager {
    pub fn new(total_rounds: u32) -> Self {
        Self::with_clock(total_rounds, SystemClock)
    }
}

impl<C: Clock> MultiRoundManager<C> {
    pub fn with_clock(total_rounds: u32, clock: C) -> Self {
        Self {
            state: Self::fresh_state(total_rounds),
            clock,
        }
    }

    fn fresh_state(total_rounds: u32) -> MultiRoundState {
        MultiRoundState {
            current_round: 1,
            total_rounds: total_rounds.max(1),
            rounds: Vec::new(),
            total_score: 0,
            consecutive_wins: 0,
            consecutive_losses: 0,
        }
    }

    pub fn state(&self) -> &MultiRoundState {
        &self.state
    }

    pub fn current_round(&self) -> u32 {
        self.state.current_round
    }

    pub fn total_rounds(&self) -> u32 {
        self.state.total_rounds
    }

    pub fn total_score(&self) -> i64 {
        self.state.total_score
    }

    pub fn rounds(&self) -> &[RoundData] {
        &self.state.rounds
    }

    /// Opens a record for the current round.
    pub fn start_round(&mut self) -> &RoundData {
        let round = self.state.current_round;
        log::debug!("Round {}/{} started", round, self.state.total_rounds);
        self.state.rounds.push(RoundData {
            round,
            start_time: self.clock.now(),
            end_time: None,
            score: 0,
            outcome: None,
            time_elapsed_ms: 0,
            moves_used: 0,
        });
        &self.state.rounds[self.state.rounds.len() - 1]
    }

    /// Closes the open round of the current round number. Returns `None` when
    /// no such round was started.
    pub fn complete_round(&mut self, outcome: RoundOutcome, score: i64, moves: u32) -> Option<&RoundData> {
        let now = self.clock.now();
        let current = self.state.current_round;
        let index = self
            .state
            .rounds
            .iter()
            .rposition(|round| round.round == current && !round.is_finished());

        let Some(index) = index else {
            log::warn!("Round {} completed without being started", current);
            return None;
        };

        let round = &mut self.state.rounds[index];
        round.end_time = Some(now);
        round.score = score;
        round.outcome = Some(outcome);
        round.time_elapsed_ms = now.saturating_sub(round.start_time);
        round.moves_used = moves;

        self.state.total_score += score;
        match outcome {
            RoundOutcome::Won => {
                self.state.consecutive_wins += 1;
                self.state.consecutive_losses = 0;
            }
            RoundOutcome::Lost => {
                self.state.consecutive_losses += 1;
                self.state.consecutive_wins = 0;
            }
        }
        log::debug!(
            "Round {} {:?} for {} points, total {}",
            current,
            outcome,
            score,
            self.state.total_score
        );

        Some(&self.state.rounds[index])
    }

    /// Moves to the next round. Returns `false` on the last round.
    pub fn next_round(&mut self) -> bool {
        if self.state.current_round >= self.state.total_rounds {
            return false;
        }
        self.state.current_round += 1;
        true
    }

    /// Done once past the last round, or once the last round has been closed.
    pub fn is_complete(&self) -> bool {
        let last = self.state.total_rounds;
        self.state.current_round > last
            || (self.state.current_round == last
                && self
                    .state
                    .rounds
                    .iter()
                    .any(|round| round.round == last && round.is_finished()))
    }

    pub fn current_round_data(&self) -> Option<&RoundData> {
        self.state
            .rounds
            .iter()
            .rev()
            .find(|round| round.round == self.state.current_round)
    }

    /// Round multiplier, a quarter more for every consecutive win.
    pub fn combo_multiplier(&self) -> f64 {
        1.0 + f64::from(self.state.consecutive_wins) * 0.25
    }

    pub fn consecutive_wins(&self) -> u32 {
        self.state.consecutive_wins
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.state.consecutive_losses
    }

    pub fn win_count(&self) -> usize {
        self.count_outcome(RoundOutcome::Won)
    }

    pub fn loss_count(&self) -> usize {
        self.count_outcome(RoundOutcome::Lost)
    }

    fn count_outcome(&self, outcome: RoundOutcome) -> usize {
        self.state
            .rounds
            .iter()
            .filter(|round| round.outcome == Some(outcome))
            .count()
    }

    /// Mean score of finished rounds.
    pub fn average_score(&self) -> f64 {
        let finished: Vec<_> = self.state.rounds.iter().filter(|round| round.is_finished()).collect();
        if finished.is_empty() {
            return 0.0;
        }
        finished.iter().map(|round| round.score as f64).sum::<f64>() / finished.len() as f64
    }

    pub fn reset(&mut self) {
        self.state = Self::fresh_state(self.state.total_rounds);
    }
}
