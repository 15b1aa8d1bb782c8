//! Recovery code symbols and progress

use serde::{Deserialize, Serialize};

/// Length of the recovery code
pub const RECOVERY_CODE_LEN: usize = 10;

/// A discrete input symbol fed to the recovery matcher
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySymbol {
    Up,
    Down,
    Left,
    Right,
    /// Any letter key, stored uppercase
    Key(char),
    /// Anything else the input source delivers
    Other(String),
}

impl RecoverySymbol {
    /// Parse a terminal token: arrows, words (`up`, `left`), single letters
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "↑" => return RecoverySymbol::Up,
            "↓" => return RecoverySymbol::Down,
            "←" => return RecoverySymbol::Left,
            "→" => return RecoverySymbol::Right,
            _ => {}
        }
        let lower = token.trim().to_lowercase();
        match lower.as_str() {
            "up" | "arrowup" => RecoverySymbol::Up,
            "down" | "arrowdown" => RecoverySymbol::Down,
            "left" | "arrowleft" => RecoverySymbol::Left,
            "right" | "arrowright" => RecoverySymbol::Right,
            other => {
                let key = other.strip_prefix("key").unwrap_or(other);
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => {
                        RecoverySymbol::Key(c.to_ascii_uppercase())
                    }
                    _ => RecoverySymbol::Other(token.trim().to_string()),
                }
            }
        }
    }

    /// Glyph shown on the recovery panel
    pub fn glyph(&self) -> String {
        match self {
            RecoverySymbol::Up => "↑".to_string(),
            RecoverySymbol::Down => "↓".to_string(),
            RecoverySymbol::Left => "←".to_string(),
            RecoverySymbol::Right => "→".to_string(),
            RecoverySymbol::Key(c) => c.to_string(),
            RecoverySymbol::Other(s) => s.clone(),
        }
    }

    /// ↑ ↑ ↓ ↓ ← → ← → B A
    pub fn default_code() -> Vec<RecoverySymbol> {
        use RecoverySymbol::*;
        vec![Up, Up, Down, Down, Left, Right, Left, Right, Key('B'), Key('A')]
    }
}

impl std::fmt::Display for RecoverySymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Per-position status for progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Matched,
    Wrong,
    Pending,
}

/// Snapshot of matcher progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryProgress {
    pub entered_count: usize,
    pub total: usize,
    pub slots: Vec<SlotStatus>,
}
