//! Core modules for the number station

pub mod codec;
pub mod sequencer;
pub mod sanity;
pub mod recovery;
pub mod possession;
pub mod effects;
pub mod clock;
pub mod store;
pub mod session;

pub use codec::{encode, decode, timings_for, waveform_for, looks_like_morse};
pub use sequencer::{PlaybackSequencer, PlaybackState, schedule, total_duration_ms};
pub use sanity::SanityEngine;
pub use recovery::{RecoveryMatcher, SubmitOutcome};
pub use possession::{PossessionMachine, PossessionState, TickOutcome, TimerToken, Transition};
pub use effects::{EffectSink, EffectSinks, BroadcastSink, EventLog, NullSink, StationEvent};
pub use clock::{Clock, TokioClock, ManualClock};
pub use store::{KeyValueStore, JsonDirStore, MemoryStore, put_json, STATS_KEY, MESSAGES_KEY};
pub use session::StationSession;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
