//! Input replay log
//!
//! Recording appends `(timestamp, action)` pairs while the player controls the
//! actor. Timestamps are elapsed substep ticks of the current attempt, so a
//! replay reissues every action at exactly the tick it originally happened.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayAction {
    Jump,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayEvent {
    pub frame_timestamp: u64,
    pub action: ReplayAction,
}

/// Append-only, timestamp-ordered action log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    events: Vec<ReplayEvent>,
}

impl ReplayLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action. A timestamp earlier than the last entry is clamped
    /// to it so the log stays ordered.
    pub fn record(&mut self, frame_timestamp: u64, action: ReplayAction) {
        let frame_timestamp = self
            .events
            .last()
            .map_or(frame_timestamp, |last| frame_timestamp.max(last.frame_timestamp));
        self.events.push(ReplayEvent {
            frame_timestamp,
            action,
        });
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Timestamp of the last event
    pub fn duration(&self) -> u64 {
        self.events.last().map_or(0, |e| e.frame_timestamp)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let mut log: ReplayLog = serde_json::from_str(json)?;
        log.events.sort_by_key(|e| e.frame_timestamp);
        Ok(log)
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let log = Self::from_json(&std::fs::read_to_string(path.as_ref())?)?;
        log::info!("Loaded replay {} ({} events)", path.as_ref().display(), log.len());
        Ok(log)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Read-only cursor over a log
#[derive(Debug, Clone)]
pub struct ReplayPlayer {
    log: ReplayLog,
    cursor: usize,
}

impl ReplayPlayer {
    pub fn new(log: ReplayLog) -> Self {
        Self { log, cursor: 0 }
    }

    /// Events whose timestamp has been reached, in order. Each event is
    /// returned once.
    pub fn drain_due(&mut self, elapsed: u64) -> &[ReplayEvent] {
        let start = self.cursor;
        let pending = &self.log.events[start..];
        let due = pending.partition_point(|e| e.frame_timestamp <= elapsed);
        self.cursor += due;
        &self.log.events[start..self.cursor]
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.log.events.len()
    }

    pub fn log(&self) -> &ReplayLog {
        &self.log
    }
}
