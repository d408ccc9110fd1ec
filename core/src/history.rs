use alloc::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_size: 50 }
    }
}

/// A saved copy of a game state. Never shares data with the live state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub state: GameState,
    pub timestamp: Timestamp,
    pub action: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_states: usize,
    pub current_index: Option<usize>,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Size of the serialized history, in bytes.
    pub memory_usage: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub index: usize,
    pub action: String,
    pub timestamp: Timestamp,
    pub is_current: bool,
}

#[derive(Serialize, Deserialize)]
struct HistoryExport {
    history: Vec<GameStateSnapshot>,
    current_index: Option<usize>,
    max_size: usize,
}

/// Linear undo/redo over full game-state snapshots.
///
/// Saving while undone discards the redo branch. Once over `max_size`, the
/// oldest snapshot is dropped.
#[derive(Clone, Debug)]
pub struct History<C = SystemClock> {
    entries: VecDeque<GameStateSnapshot>,
    cursor: Option<usize>,
    max_size: usize,
    clock: C,
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<C: Clock> History<C> {
    pub fn with_clock(config: HistoryConfig, clock: C) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            max_size: config.max_size.max(1),
            clock,
        }
    }

    pub fn save_state(&mut self, state: &GameState, action: impl Into<String>) {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        self.entries.truncate(keep);

        self.entries.push_back(GameStateSnapshot {
            state: state.clone(),
            timestamp: self.clock.now(),
            action: action.into(),
        });

        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn undo(&mut self) -> Option<GameState> {
        let cursor = self.cursor.filter(|&cursor| cursor > 0)?;
        self.cursor = Some(cursor - 1);
        self.current_state()
    }

    pub fn redo(&mut self) -> Option<GameState> {
        let cursor = self.cursor.filter(|&cursor| cursor + 1 < self.entries.len())?;
        self.cursor = Some(cursor + 1);
        self.current_state()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor + 1 < self.entries.len())
    }

    /// Moves straight to the snapshot at `index`, if there is one.
    pub fn jump_to_state(&mut self, index: usize) -> Option<GameState> {
        if index >= self.entries.len() {
            return None;
        }
        self.cursor = Some(index);
        self.current_state()
    }

    pub fn current_state(&self) -> Option<GameState> {
        self.cursor
            .and_then(|cursor| self.entries.get(cursor))
            .map(|snapshot| snapshot.state.clone())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn summary(&self) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, snapshot)| HistoryEntry {
                index,
                action: snapshot.action.clone(),
                timestamp: snapshot.timestamp,
                is_current: self.cursor == Some(index),
            })
            .collect()
    }

    pub fn statistics(&self) -> HistoryStats {
        HistoryStats {
            total_states: self.entries.len(),
            current_index: self.cursor,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            memory_usage: serde_json::to_vec(&self.entries)
                .map(|bytes| bytes.len())
                .unwrap_or(0),
        }
    }

    pub fn export_history(&self) -> Result<String> {
        let export = HistoryExport {
            history: self.entries.iter().cloned().collect(),
            current_index: self.cursor,
            max_size: self.max_size,
        };
        let json = serde_json::to_string(&export).map_err(|err| RulesError::Export(err.to_string()))?;
        log::debug!("Exported {} history entries", export.history.len());
        Ok(json)
    }

    /// Replaces the history with an exported one. On error the current
    /// history is left as it was.
    pub fn import_history(&mut self, data: &str) -> Result<()> {
        let export: HistoryExport = serde_json::from_str(data).map_err(|err| {
            log::warn!("Rejected history import: {}", err);
            RulesError::Import(err.to_string())
        })?;

        let len = export.history.len();
        let cursor_ok = match export.current_index {
            Some(index) => index < len,
            None => len == 0,
        };
        if !cursor_ok {
            log::warn!("Rejected history import: index {:?} of {}", export.current_index, len);
            return Err(RulesError::Import(format!(
                "current index {:?} out of range for {} entries",
                export.current_index, len
            )));
        }

        self.max_size = export.max_size.max(1);
        self.entries = export.history.into();
        self.cursor = export.current_index;

        let overflow = self.entries.len().saturating_sub(self.max_size);
        if overflow > 0 {
            self.entries.drain(..overflow);
            self.cursor = self.cursor.map(|cursor| cursor.saturating_sub(overflow));
        }

        log::debug!("Imported {} history entries", self.entries.len());
        Ok(())
    }
}
