//! Reason codes for session outputs and transitions

use serde::{Deserialize, Serialize};

/// Reason codes attached to every tick output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R101: Sanity
    // =========================================================================
    /// Sanity decaying normally
    R101_SANITY_DECAYING,
    /// Decay is paused
    R101_SANITY_PAUSED,

    // =========================================================================
    // R102: Mode
    // =========================================================================
    /// Possessed, waiting for timeout or recovery code
    R102_STATE_POSSESSED,

    // =========================================================================
    // R103: Transitions
    // =========================================================================
    /// NORMAL -> POSSESSED
    R103_TRANSITION_TO_POSSESSED,
    /// POSSESSED -> NORMAL after the deadline
    R103_RECOVERED_BY_TIMEOUT,
    /// POSSESSED -> NORMAL after the recovery code
    R103_RECOVERED_BY_CODE,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_SANITY_DECAYING => "R101_SANITY_DECAYING",
            Self::R101_SANITY_PAUSED => "R101_SANITY_PAUSED",
            Self::R102_STATE_POSSESSED => "R102_STATE_POSSESSED",
            Self::R103_TRANSITION_TO_POSSESSED => "R103_TRANSITION_TO_POSSESSED",
            Self::R103_RECOVERED_BY_TIMEOUT => "R103_RECOVERED_BY_TIMEOUT",
            Self::R103_RECOVERED_BY_CODE => "R103_RECOVERED_BY_CODE",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_SANITY_DECAYING => "Signal interference accumulating",
            Self::R101_SANITY_PAUSED => "Decay suspended",
            Self::R102_STATE_POSSESSED => "Signal hijacked by entity",
            Self::R103_TRANSITION_TO_POSSESSED => "Upside Down breach",
            Self::R103_RECOVERED_BY_TIMEOUT => "Portal sealed after timeout",
            Self::R103_RECOVERED_BY_CODE => "Portal sealed by recovery sequence",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
