//! Output structures for terminal display

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{PossessionMode, ReasonCode, SanityLevel};

/// Output structure for each tick or status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationOutput {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Current sanity value
    pub sanity: f64,
    /// Sanity band
    pub level: SanityLevel,
    /// Current mode
    pub mode: PossessionMode,
    /// Milliseconds until auto-recovery (possessed only)
    pub recovery_remaining_ms: Option<u64>,
    /// Recovery symbols currently in the window
    pub recovery_entered: usize,
    /// Reason for current output
    pub reason: ReasonCode,
}

impl StationOutput {
    /// Create new output
    pub fn new(
        sanity: f64,
        mode: PossessionMode,
        recovery_remaining_ms: Option<u64>,
        recovery_entered: usize,
        reason: ReasonCode,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            sanity,
            level: SanityLevel::from_value(sanity),
            mode,
            recovery_remaining_ms,
            recovery_entered,
            reason,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.mode.color_code();
        let reset = PossessionMode::color_reset();
        let emoji = self.mode.emoji();

        format!(
            "{}{} sanity={:.1} | {} | mode={}{} | {}{}",
            color,
            emoji,
            self.sanity,
            self.level.warning(),
            self.mode,
            self.remaining_suffix(),
            self.reason.code(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "sanity={:.1} | level={:?} | mode={}{} | reason={}",
            self.sanity,
            self.level,
            self.mode,
            self.remaining_suffix(),
            self.reason.code()
        )
    }

    /// Terminal string, or the parseable one when colors are disabled
    pub fn render(&self, no_color: bool) -> String {
        if no_color {
            self.to_parseable_string()
        } else {
            self.to_terminal_string()
        }
    }

    fn remaining_suffix(&self) -> String {
        match self.recovery_remaining_ms {
            Some(ms) => format!(
                " | recovery in {:.1}s | code {}/10",
                ms as f64 / 1000.0,
                self.recovery_entered
            ),
            None => String::new(),
        }
    }
}
