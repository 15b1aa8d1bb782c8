//! Sanity state and display levels

use std::time::Instant;
use serde::{Deserialize, Serialize};

/// Raw sanity state owned by the sanity engine
#[derive(Debug, Clone)]
pub struct SanityState {
    /// Current value: 0.0..=max_value
    pub value: f64,
    /// Upper bound, fixed at construction
    pub max_value: f64,
    /// Points lost per second while not paused
    pub decay_rate_per_second: f64,
    /// Last time decay was charged
    pub last_update: Instant,
    /// Decay suspended
    pub paused: bool,
}

impl SanityState {
    /// Full sanity at `now`
    pub fn new(max_value: f64, decay_rate_per_second: f64, now: Instant) -> Self {
        Self {
            value: max_value,
            max_value,
            decay_rate_per_second,
            last_update: now,
            paused: false,
        }
    }

    /// Clamp a candidate value into [0, max_value]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(0.0, self.max_value)
    }
}

/// Coarse sanity bands used by displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanityLevel {
    /// > 70
    Stable,
    /// > 40
    Unstable,
    /// > 20
    Critical,
    /// > 0
    Danger,
    /// <= 0
    Possessed,
}

impl SanityLevel {
    /// Band for a sanity value on the 0-100 scale
    pub fn from_value(value: f64) -> Self {
        if value > 70.0 {
            SanityLevel::Stable
        } else if value > 40.0 {
            SanityLevel::Unstable
        } else if value > 20.0 {
            SanityLevel::Critical
        } else if value > 0.0 {
            SanityLevel::Danger
        } else {
            SanityLevel::Possessed
        }
    }

    /// Warning banner text
    pub fn warning(&self) -> &'static str {
        match self {
            SanityLevel::Stable => "SYSTEM STABLE",
            SanityLevel::Unstable => "INTERFERENCE DETECTED",
            SanityLevel::Critical => "CRITICAL WARNING",
            SanityLevel::Danger => "DIMENSIONAL BREACH",
            SanityLevel::Possessed => "POSSESSED",
        }
    }

    /// Meter color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            SanityLevel::Stable => "#00ff41",
            SanityLevel::Unstable => "#ffb000",
            SanityLevel::Critical => "#ff6600",
            SanityLevel::Danger | SanityLevel::Possessed => "#ff0000",
        }
    }
}

/// Screen shake intensity in 0.0..=1.0, rising as sanity falls
pub fn shake_intensity(value: f64) -> f64 {
    ((100.0 - value) / 100.0).max(0.0)
}
