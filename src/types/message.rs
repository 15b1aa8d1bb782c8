//! Transmitted messages and session statistics

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Contact label used when no contact is selected
pub const BROADCAST_CONTACT: &str = "BROADCAST";

/// A message sent through the station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmittedMessage {
    pub text: String,
    pub morse_code: String,
    pub timestamp: DateTime<Utc>,
    pub contact_label: String,
}

impl TransmittedMessage {
    /// Create a message stamped now; `None` contact becomes BROADCAST
    pub fn new(text: impl Into<String>, morse_code: impl Into<String>, contact: Option<&str>) -> Self {
        Self {
            text: text.into(),
            morse_code: morse_code.into(),
            timestamp: Utc::now(),
            contact_label: contact.unwrap_or(BROADCAST_CONTACT).to_string(),
        }
    }
}

/// Running statistics for a session, written through to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub messages_sent: u64,
    pub possessions: u64,
    pub recoveries: u64,
    /// Exponential average: (previous + sample) / 2 per tick
    pub avg_sanity: f64,
    /// Longest transmitted text, in characters
    pub longest_message: usize,
    /// Transmissions per local hour of day
    pub activity_by_hour: [u32; 24],
    /// Seconds spent in the app across stopped sessions
    pub time_in_app_secs: u64,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            messages_sent: 0,
            possessions: 0,
            recoveries: 0,
            avg_sanity: 100.0,
            longest_message: 0,
            activity_by_hour: [0; 24],
            time_in_app_secs: 0,
        }
    }
}

impl SessionStats {
    /// Fold a sanity sample into the running average
    pub fn record_sanity(&mut self, sanity: f64) {
        self.avg_sanity = (self.avg_sanity + sanity) / 2.0;
    }

    /// Account for a transmission at the given hour (0-23)
    pub fn record_message(&mut self, text: &str, hour: u32) {
        self.messages_sent += 1;
        self.longest_message = self.longest_message.max(text.chars().count());
        if let Some(slot) = self.activity_by_hour.get_mut(hour as usize) {
            *slot += 1;
        }
    }
}
