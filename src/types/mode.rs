//! Possession mode definitions

use serde::{Deserialize, Serialize};

/// The two possible modes of a station session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PossessionMode {
    /// Regular operation, sanity decaying
    #[default]
    Normal,
    /// Sanity hit zero, signal hijacked until recovery
    Possessed,
}

impl PossessionMode {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            PossessionMode::Normal => "\x1b[32m",    // Green
            PossessionMode::Possessed => "\x1b[31m", // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for mode
    pub fn emoji(&self) -> &'static str {
        match self {
            PossessionMode::Normal => "📻",
            PossessionMode::Possessed => "👹",
        }
    }

    pub fn is_possessed(&self) -> bool {
        matches!(self, PossessionMode::Possessed)
    }
}

impl std::fmt::Display for PossessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PossessionMode::Normal => "NORMAL",
            PossessionMode::Possessed => "POSSESSED",
        };
        write!(f, "{}", name)
    }
}

/// Why a possession ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCause {
    /// The auto-recovery deadline elapsed
    Timeout,
    /// The recovery code was entered
    RecoveryCode,
}

impl std::fmt::Display for ExitCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCause::Timeout => write!(f, "auto-recovery timeout"),
            ExitCause::RecoveryCode => write!(f, "recovery code"),
        }
    }
}
