//! Station session: composition root that owns the drivers
//!
//! - 100ms interval task → PossessionMachine::tick
//! - one-shot auto-recovery task per possession, aborted on early exit
//! - playback sequencer for transmissions and replays
//!
//! The machine sits behind a mutex, so tick → threshold → transition is
//! one critical section.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use chrono::{Local, Timelike};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::StationConfig;
use crate::core::clock::{Clock, TokioClock};
use crate::core::codec;
use crate::core::effects::{BroadcastSink, EffectSink, EffectSinks, StationEvent};
use crate::core::lock;
use crate::core::possession::{PossessionMachine, TimerToken, Transition};
use crate::core::recovery::SubmitOutcome;
use crate::core::sequencer::{PlaybackSequencer, PlaybackState};
use crate::core::store::{put_json, KeyValueStore, MESSAGES_KEY, STATS_KEY};
use crate::error::Result;
use crate::types::{
    MorseTimingEvent, PossessionMode, RecoveryProgress, RecoverySymbol, SessionStats,
    StationOutput, TransmittedMessage,
};

/// Capacity of the live event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// State shared with the driver tasks
struct Shared {
    machine: Mutex<PossessionMachine>,
    stats: Mutex<SessionStats>,
    messages: Mutex<Vec<TransmittedMessage>>,
    recovery_timer: Mutex<Option<JoinHandle<()>>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: StationConfig,
}

impl Shared {
    /// One driver step: tick the machine and apply its transition
    fn tick(self: &Arc<Self>) {
        let outcome = lock(&self.machine).tick(self.clock.now());

        if outcome.output.mode == PossessionMode::Normal || outcome.transition.is_some() {
            lock(&self.stats).record_sanity(outcome.output.sanity);
        }
        if let Some(transition) = outcome.transition {
            self.apply(transition);
        }
    }

    /// Side effects the session owns: timers, statistics, persistence
    fn apply(self: &Arc<Self>, transition: Transition) {
        debug!(reason = transition.reason().code(), "Applying transition");
        match transition {
            Transition::Entered { token, deadline } => {
                lock(&self.stats).possessions += 1;
                self.arm_recovery_timer(token, deadline);
            }
            Transition::Exited { cause } => {
                if let Some(handle) = lock(&self.recovery_timer).take() {
                    handle.abort();
                }
                lock(&self.stats).recoveries += 1;
                debug!(%cause, "Recovery timer disarmed");
            }
        }
        self.persist_stats();
    }

    fn arm_recovery_timer(self: &Arc<Self>, token: TimerToken, deadline: Instant) {
        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;

            // Detach our own handle so the exit path doesn't abort us
            drop(lock(&shared.recovery_timer).take());

            let transition = lock(&shared.machine).fire_timer(token, shared.clock.now());
            if let Some(transition) = transition {
                shared.apply(transition);
            }
        });

        if let Some(stale) = lock(&self.recovery_timer).replace(handle) {
            stale.abort();
        }
    }

    fn persist_stats(&self) {
        if !self.config.auto_save {
            return;
        }
        let stats = lock(&self.stats).clone();
        if let Err(err) = put_json(self.store.as_ref(), STATS_KEY, &stats) {
            warn!(error = %err, "Failed to persist session stats");
        }
    }

    fn persist_messages(&self) {
        if !self.config.auto_save {
            return;
        }
        let messages = lock(&self.messages).clone();
        if let Err(err) = put_json(self.store.as_ref(), MESSAGES_KEY, &messages) {
            warn!(error = %err, "Failed to persist message archive");
        }
    }
}

/// A running number-station session
pub struct StationSession {
    shared: Arc<Shared>,
    sequencer: PlaybackSequencer,
    events: broadcast::Sender<StationEvent>,
    driver: Mutex<Option<JoinHandle<()>>>,
    started_at: Mutex<Option<Instant>>,
}

impl StationSession {
    /// Build a session on tokio's clock. `effects` receives sound/LED
    /// events only when `sound_enabled` is set; subscribers always do.
    pub fn new(
        config: StationConfig,
        store: Arc<dyn KeyValueStore>,
        effects: Arc<dyn EffectSink>,
    ) -> Result<Self> {
        Self::with_clock(config, store, effects, Arc::new(TokioClock))
    }

    /// Build a session on a custom clock; it must agree with tokio's timers
    pub fn with_clock(
        config: StationConfig,
        store: Arc<dyn KeyValueStore>,
        effects: Arc<dyn EffectSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut sinks = EffectSinks::new().with(Arc::new(BroadcastSink::new(events.clone())));
        if config.sound_enabled {
            sinks = sinks.with(effects);
        }
        let sinks: Arc<dyn EffectSink> = Arc::new(sinks);

        let machine = PossessionMachine::new(&config, clock.now(), Arc::clone(&sinks))?;

        Ok(Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(machine),
                stats: Mutex::new(SessionStats::default()),
                messages: Mutex::new(Vec::new()),
                recovery_timer: Mutex::new(None),
                store,
                clock,
                config,
            }),
            sequencer: PlaybackSequencer::new(sinks),
            events,
            driver: Mutex::new(None),
            started_at: Mutex::new(None),
        })
    }

    /// Start the periodic sanity driver. No-op if already running.
    pub fn start(&self) {
        let mut driver = lock(&self.driver);
        if driver.is_some() {
            return;
        }

        // Decay is charged from now, not from construction
        let now = self.shared.clock.now();
        {
            let mut machine = lock(&self.shared.machine);
            if !machine.sanity().is_paused() {
                machine.resume(now);
            }
        }
        *lock(&self.started_at) = Some(now);

        let shared = Arc::clone(&self.shared);
        let period = shared.config.tick_interval();
        *driver = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                shared.tick();
            }
        }));

        info!(
            decay_rate = self.shared.config.decay_rate,
            tick_ms = self.shared.config.tick_interval_ms,
            "WSQK signal relay initialized"
        );
    }

    /// Cancel the driver, any pending recovery timer and playback
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.driver).take() {
            handle.abort();
        }
        if let Some(handle) = lock(&self.shared.recovery_timer).take() {
            handle.abort();
        }
        self.sequencer.cancel();

        if let Some(started) = lock(&self.started_at).take() {
            let secs = self.shared.clock.now().saturating_duration_since(started).as_secs();
            lock(&self.shared.stats).time_in_app_secs += secs;
        }
        self.shared.persist_stats();
        info!("WSQK signal relay stopped");
    }

    pub fn is_running(&self) -> bool {
        lock(&self.driver).is_some()
    }

    /// Live event stream
    pub fn subscribe(&self) -> broadcast::Receiver<StationEvent> {
        self.events.subscribe()
    }

    // -------------------------------------------------------------------------
    // Sanity / possession
    // -------------------------------------------------------------------------

    /// Run one driver step by hand
    pub fn tick(&self) -> StationOutput {
        self.shared.tick();
        self.status()
    }

    pub fn sanity_value(&self) -> f64 {
        lock(&self.shared.machine).sanity_value()
    }

    pub fn mode(&self) -> PossessionMode {
        lock(&self.shared.machine).mode()
    }

    pub fn recovery_progress(&self) -> RecoveryProgress {
        lock(&self.shared.machine).recovery_progress()
    }

    pub fn status(&self) -> StationOutput {
        lock(&self.shared.machine).current_output(self.shared.clock.now())
    }

    /// Feed one symbol from the input source
    pub fn submit_symbol(&self, symbol: RecoverySymbol) -> SubmitOutcome {
        let (outcome, transition) =
            lock(&self.shared.machine).submit_symbol(symbol, self.shared.clock.now());
        if let Some(transition) = transition {
            self.shared.apply(transition);
        }
        outcome
    }

    pub fn damage(&self, amount: f64) -> f64 {
        lock(&self.shared.machine).damage(amount)
    }

    pub fn heal(&self, amount: f64) -> f64 {
        lock(&self.shared.machine).heal(amount)
    }

    pub fn pause(&self) {
        lock(&self.shared.machine).pause();
    }

    pub fn resume(&self) {
        lock(&self.shared.machine).resume(self.shared.clock.now());
    }

    /// Settings change: applies to the live engine
    pub fn set_decay_rate(&self, rate: f64) -> Result<()> {
        lock(&self.shared.machine).set_decay_rate(rate)
    }

    // -------------------------------------------------------------------------
    // Codec and playback
    // -------------------------------------------------------------------------

    pub fn encode_text(text: &str) -> String {
        codec::encode(text)
    }

    pub fn decode_morse(morse: &str) -> String {
        codec::decode(morse)
    }

    pub fn timings(morse: &str) -> Vec<MorseTimingEvent> {
        codec::timings_for(morse)
    }

    /// Encode, archive and play a message. `None` when nothing in `text`
    /// maps to Morse; such input is neither archived nor counted.
    pub fn transmit(&self, text: &str, contact: Option<&str>) -> Option<TransmittedMessage> {
        let morse = codec::encode(text);
        if morse.is_empty() {
            debug!(chars = text.chars().count(), "Nothing to transmit");
            return None;
        }
        let message = TransmittedMessage::new(text, morse.clone(), contact);

        lock(&self.shared.stats).record_message(text, Local::now().hour());
        lock(&self.shared.messages).push(message.clone());
        self.shared.persist_messages();
        self.shared.persist_stats();

        info!(contact = %message.contact_label, chars = text.chars().count(), "Signal transmitted");
        self.replay(&morse);
        Some(message)
    }

    /// Play Morse without archiving. False if already playing or empty.
    pub fn replay(&self, morse: &str) -> bool {
        let possessed = self.mode().is_possessed();
        self.sequencer.play(codec::timings_for(morse), possessed)
    }

    pub fn playback(&self) -> PlaybackState {
        self.sequencer.state()
    }

    pub fn cancel_playback(&self) {
        self.sequencer.cancel();
    }

    // -------------------------------------------------------------------------
    // Archive and statistics
    // -------------------------------------------------------------------------

    pub fn stats(&self) -> SessionStats {
        lock(&self.shared.stats).clone()
    }

    pub fn messages(&self) -> Vec<TransmittedMessage> {
        lock(&self.shared.messages).clone()
    }

    pub fn config(&self) -> &StationConfig {
        &self.shared.config
    }
}

impl Drop for StationSession {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.driver).take() {
            handle.abort();
        }
        if let Some(handle) = lock(&self.shared.recovery_timer).take() {
            handle.abort();
        }
    }
}
