//! Morse timing structures for playback

use serde::{Deserialize, Serialize};

/// Kind of a timing event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Dot,
    Dash,
    Gap,
}

impl SignalKind {
    /// Dots and dashes drive the LED / beep; gaps are silence
    pub fn is_audible(&self) -> bool {
        !matches!(self, SignalKind::Gap)
    }

    /// Display color, swapped while possessed
    pub fn color(&self, possessed: bool) -> &'static str {
        match (self, possessed) {
            (SignalKind::Dot, false) => "#00ff41",
            (SignalKind::Dot, true) => "#ff0066",
            (_, false) => "#ffb000",
            (_, true) => "#00ffff",
        }
    }

    /// `color` as an RGB triple for truecolor terminals
    pub fn color_rgb(&self, possessed: bool) -> (u8, u8, u8) {
        let hex = self.color(possessed).trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SignalKind::Dot => "dot",
            SignalKind::Dash => "dash",
            SignalKind::Gap => "gap",
        };
        write!(f, "{}", name)
    }
}

/// A single dot/dash/gap with its duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorseTimingEvent {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    /// Always > 0
    pub duration_ms: u64,
}

impl MorseTimingEvent {
    pub fn new(kind: SignalKind, duration_ms: u64) -> Self {
        Self { kind, duration_ms }
    }
}

/// An event placed on the playback timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledSignal {
    /// Position in the source sequence
    pub index: usize,
    /// Cumulative start offset from sequence start
    pub offset_ms: u64,
    pub kind: SignalKind,
    pub duration_ms: u64,
}

impl ScheduledSignal {
    /// Offset at which this event ends
    pub fn end_ms(&self) -> u64 {
        self.offset_ms + self.duration_ms
    }
}
