use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_MAX_HISTORY: usize = 100;

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub key: String,
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

impl StateChange {
    pub fn can_restore(&self) -> bool {
        !self.before.is_null()
    }
}

/// One executed (or about to be executed) command with the state it touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSnapshot {
    pub id: String,
    pub command: String,
    pub command_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateChange>,
    pub reversible: bool,
    pub executed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandSnapshot {
    pub fn new(command: impl Into<String>, command_name: impl Into<String>) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("cmd_{}", &id[..12]),
            command: command.into(),
            command_name: command_name.into(),
            timestamp: Utc::now(),
            states: Vec::new(),
            reversible: true,
            executed: false,
            error: None,
        }
    }

    pub fn add_state(
        &mut self,
        key: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) {
        self.states.push(StateChange {
            key: key.into(),
            before,
            after,
        });
    }

    /// A failed execution can never be undone.
    pub fn mark_executed(&mut self, error: Option<String>) {
        self.executed = true;
        if error.is_some() {
            self.reversible = false;
        }
        self.error = error;
    }

    pub fn can_undo(&self) -> bool {
        self.reversible && self.executed && self.error.is_none()
    }

    /// `✓ [12:04:55] /analyze-data @file:a.csv`, with the command cut to
    /// `max_len` characters.
    pub fn display(&self, max_len: usize) -> String {
        let mark = match (self.executed, self.error.is_some()) {
            (_, true) => '✗',
            (true, false) => '✓',
            (false, false) => '○',
        };
        let count = self.command.chars().count();
        let command = if count > max_len && max_len > 3 {
            let head: String = self.command.chars().take(max_len - 3).collect();
            format!("{head}...")
        } else {
            self.command.clone()
        };
        format!("{mark} [{}] {command}", self.timestamp.format("%H:%M:%S"))
    }
}

impl fmt::Display for CommandSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(50))
    }
}

// ---------------------------------------------------------------------------
// HistoryStack
// ---------------------------------------------------------------------------

/// Bounded undo stack plus redo stack. Pushing a new snapshot discards the
/// redo stack; once full, the oldest undo entry is dropped.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    max_history: usize,
    undo: VecDeque<CommandSnapshot>,
    redo: Vec<CommandSnapshot>,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryStack {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn push(&mut self, snapshot: CommandSnapshot) {
        if self.undo.len() == self.max_history {
            self.undo.pop_front();
        }
        tracing::debug!(id = %snapshot.id, command = %snapshot.command_name, "history push");
        self.undo.push_back(snapshot);
        self.redo.clear();
    }

    pub fn undo(&mut self) -> Option<&CommandSnapshot> {
        let snapshot = self.undo.pop_back()?;
        self.redo.push(snapshot);
        self.redo.last()
    }

    /// Undo up to `steps` entries, most recent first.
    pub fn undo_steps(&mut self, steps: usize) -> Vec<CommandSnapshot> {
        let mut undone = Vec::new();
        for _ in 0..steps {
            match self.undo() {
                Some(s) => undone.push(s.clone()),
                None => break,
            }
        }
        undone
    }

    pub fn redo(&mut self) -> Option<&CommandSnapshot> {
        let snapshot = self.redo.pop()?;
        self.undo.push_back(snapshot);
        self.undo.back()
    }

    pub fn redo_steps(&mut self, steps: usize) -> Vec<CommandSnapshot> {
        let mut redone = Vec::new();
        for _ in 0..steps {
            match self.redo() {
                Some(s) => redone.push(s.clone()),
                None => break,
            }
        }
        redone
    }

    pub fn peek_undo(&self) -> Option<&CommandSnapshot> {
        self.undo.back()
    }

    pub fn peek_redo(&self) -> Option<&CommandSnapshot> {
        self.redo.last()
    }

    /// Undo entries, most recent first.
    pub fn recent(&self, limit: Option<usize>) -> Vec<&CommandSnapshot> {
        let iter = self.undo.iter().rev();
        match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }

    /// What `undo_steps(steps)` would undo, without changing anything.
    pub fn preview(&self, steps: usize) -> Vec<&CommandSnapshot> {
        self.undo.iter().rev().take(steps).collect()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    pub fn len(&self) -> usize {
        self.undo.len() + self.redo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
