//! Effect sinks: how the core notifies audio, LEDs and logs
//!
//! Collaborators are injected; there is no global sound engine.

use std::sync::{Arc, Mutex};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::lock;
use crate::types::{ExitCause, SignalKind};

/// Push notification from the core
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StationEvent {
    PossessionEntered {
        at: DateTime<Utc>,
        timeout_ms: u64,
    },
    PossessionExited {
        cause: ExitCause,
    },
    SignalActive {
        index: usize,
        kind: SignalKind,
        /// Consumers re-color / re-pitch when set
        possessed: bool,
    },
    SignalInactive {
        index: usize,
    },
    PlaybackFinished,
    PlaybackCancelled,
}

/// Receiver of core events (sound engine, LED, logger, ...)
pub trait EffectSink: Send + Sync {
    fn emit(&self, event: &StationEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EffectSink for NullSink {
    fn emit(&self, _event: &StationEvent) {}
}

/// Fan-out to several sinks, in order
#[derive(Default, Clone)]
pub struct EffectSinks(Vec<Arc<dyn EffectSink>>);

impl EffectSinks {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, sink: Arc<dyn EffectSink>) -> Self {
        self.0.push(sink);
        self
    }
}

impl EffectSink for EffectSinks {
    fn emit(&self, event: &StationEvent) {
        for sink in &self.0 {
            sink.emit(event);
        }
    }
}

/// Forwards events into a broadcast channel for live subscribers
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<StationEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<StationEvent>) -> Self {
        Self { tx }
    }
}

impl EffectSink for BroadcastSink {
    fn emit(&self, event: &StationEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event.clone());
    }
}

/// Records events for polling consumers
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<StationEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<StationEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    pub fn snapshot(&self) -> Vec<StationEvent> {
        lock(&self.events).clone()
    }
}

impl EffectSink for EventLog {
    fn emit(&self, event: &StationEvent) {
        lock(&self.events).push(event.clone());
    }
}
