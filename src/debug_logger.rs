// Debug logging of agent decisions
//
// Each decision is written as one JSON line. The writer sits behind a shared
// mutex so parallel training trials can append to the same file.

use log::error;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::Arc;

use crate::agent::AgentPhase;
use crate::types::{Move, Position};

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
struct DebugLogEntry<'a> {
    trial: usize,
    tick: u64,
    chosen_move: Move,
    phase: AgentPhase,
    head: Position,
    food: Option<Position>,
    score: u32,
    timestamp: &'a str,
}

/// Shared debug logger state
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<BufWriter<File>>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends one decision to the log
    #[allow(clippy::too_many_arguments)]
    pub fn log_move(
        &self,
        trial: usize,
        tick: u64,
        chosen_move: Move,
        phase: AgentPhase,
        head: Position,
        food: Option<Position>,
        score: u32,
    ) {
        if !self.enabled {
            return;
        }

        let timestamp = chrono::Utc::now().to_rfc3339();
        let entry = DebugLogEntry {
            trial,
            tick,
            chosen_move,
            phase,
            head,
            food,
            score,
            timestamp: &timestamp,
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
                return;
            }
        };

        let mut guard = self.file.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writeln!(writer, "{}", json_line) {
                error!("Failed to write debug log entry: {}", e);
            }
        }
    }

    /// Flushes buffered entries to disk
    pub fn flush(&self) {
        let mut guard = self.file.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writer.flush() {
                error!("Failed to flush debug log: {}", e);
            }
        }
    }
}
