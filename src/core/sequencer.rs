//! Timing/Playback Sequencer
//!
//! Places each timing event at its cumulative offset and drives
//! active/inactive signals for dots and dashes. One play invocation is
//! one spawned task, so cancelling drops all of its pending callbacks.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::core::effects::{EffectSink, StationEvent};
use crate::core::lock;
use crate::types::{MorseTimingEvent, ScheduledSignal};

/// Cumulative playback plan for a timing sequence
pub fn schedule(events: &[MorseTimingEvent]) -> Vec<ScheduledSignal> {
    let mut offset_ms = 0;
    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let signal = ScheduledSignal {
                index,
                offset_ms,
                kind: event.kind,
                duration_ms: event.duration_ms,
            };
            offset_ms += event.duration_ms;
            signal
        })
        .collect()
}

/// Sum of all event durations
pub fn total_duration_ms(events: &[MorseTimingEvent]) -> u64 {
    events.iter().map(|e| e.duration_ms).sum()
}

/// Observable playback state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_index: usize,
}

/// At-most-one concurrent playback driver
pub struct PlaybackSequencer {
    state: Arc<Mutex<PlaybackState>>,
    task: Mutex<Option<JoinHandle<()>>>,
    sink: Arc<dyn EffectSink>,
}

impl PlaybackSequencer {
    pub fn new(sink: Arc<dyn EffectSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlaybackState::default())),
            task: Mutex::new(None),
            sink,
        }
    }

    /// Start playback. Returns false (no-op) if already playing or empty.
    /// Must be called inside a tokio runtime.
    pub fn play(&self, events: Vec<MorseTimingEvent>, possessed: bool) -> bool {
        {
            let mut state = lock(&self.state);
            if state.is_playing || events.is_empty() {
                return false;
            }
            *state = PlaybackState { is_playing: true, current_index: 0 };
        }

        let total = total_duration_ms(&events);
        debug!(events = events.len(), total_ms = total, possessed, "Playback started");

        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        let handle = tokio::spawn(async move {
            let start = Instant::now();
            let at = |ms: u64| start + Duration::from_millis(ms);

            for signal in schedule(&events) {
                sleep_until(at(signal.offset_ms)).await;
                lock(&state).current_index = signal.index;

                if signal.kind.is_audible() {
                    sink.emit(&StationEvent::SignalActive {
                        index: signal.index,
                        kind: signal.kind,
                        possessed,
                    });
                    sleep_until(at(signal.end_ms())).await;
                    sink.emit(&StationEvent::SignalInactive { index: signal.index });
                }
            }

            sleep_until(at(total)).await;
            *lock(&state) = PlaybackState::default();
            sink.emit(&StationEvent::PlaybackFinished);
        });

        if let Some(previous) = lock(&self.task).replace(handle) {
            // finished task from an earlier play
            previous.abort();
        }
        true
    }

    /// Stop immediately and drop every pending callback
    pub fn cancel(&self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
        let was_playing = {
            let mut state = lock(&self.state);
            let was_playing = state.is_playing;
            *state = PlaybackState::default();
            was_playing
        };
        if was_playing {
            debug!("Playback cancelled");
            self.sink.emit(&StationEvent::PlaybackCancelled);
        }
    }

    pub fn state(&self) -> PlaybackState {
        *lock(&self.state)
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).is_playing
    }
}

impl Drop for PlaybackSequencer {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
