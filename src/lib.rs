//! WSQK number station: Morse codec, playback sequencer and the
//! sanity/possession engine behind the terminal.
//!
//! Session: clock → 100ms tick → SanityEngine → PossessionMachine → events

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::StationConfig;
pub use error::StationError;

// =============================================================================
// SANITY
// =============================================================================

/// Upper bound of the sanity meter
pub const MAX_SANITY: f64 = 100.0;

/// Default decay, points per second
pub const DEFAULT_DECAY_RATE: f64 = 0.5;

/// Period of the sanity driver (milliseconds)
pub const TICK_INTERVAL_MS: u64 = 100;

// =============================================================================
// POSSESSION
// =============================================================================

/// Auto-recovery deadline after entering POSSESSED (milliseconds)
pub const POSSESSION_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// MORSE TIMINGS [ms]
// =============================================================================

pub const DOT_DURATION_MS: u64 = 200;
pub const DASH_DURATION_MS: u64 = 600;
/// Gap after every dot or dash
pub const SYMBOL_GAP_MS: u64 = 200;
pub const LETTER_GAP_MS: u64 = 600;
pub const WORD_GAP_MS: u64 = 1400;

/// Waveform samples per dot; dashes use 3x, gaps 1/2
pub const SAMPLES_PER_SYMBOL: usize = 50;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
