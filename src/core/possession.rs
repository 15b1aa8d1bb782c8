//! Possession State Machine
//!
//! State transitions:
//! - NORMAL → POSSESSED: a tick observes sanity <= 0
//! - POSSESSED → NORMAL: armed timer fires / deadline passes (timeout)
//! - POSSESSED → NORMAL: recovery code matched
//!
//! Entry arms exactly one auto-recovery timer, identified by a token.
//! Exit disarms it, so a late fire with a stale token is inert.

use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::Utc;
use tracing::{debug, info};

use crate::config::StationConfig;
use crate::core::effects::{EffectSink, StationEvent};
use crate::core::recovery::{RecoveryMatcher, SubmitOutcome};
use crate::core::sanity::SanityEngine;
use crate::error::Result;
use crate::types::{
    ExitCause, PossessionMode, ReasonCode, RecoveryProgress, RecoverySymbol, StationOutput,
};

/// Identifies one armed auto-recovery timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Mode plus possession bookkeeping; only transitions mutate it
#[derive(Debug, Clone, Default)]
pub struct PossessionState {
    pub mode: PossessionMode,
    /// Set iff mode is POSSESSED
    pub recovery_deadline: Option<Instant>,
    pub entered_at: Option<Instant>,
}

/// A transition that just happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered { token: TimerToken, deadline: Instant },
    Exited { cause: ExitCause },
}

impl Transition {
    /// Reason code reported for this transition
    pub fn reason(&self) -> ReasonCode {
        match self {
            Transition::Entered { .. } => ReasonCode::R103_TRANSITION_TO_POSSESSED,
            Transition::Exited { cause: ExitCause::Timeout } => ReasonCode::R103_RECOVERED_BY_TIMEOUT,
            Transition::Exited { cause: ExitCause::RecoveryCode } => {
                ReasonCode::R103_RECOVERED_BY_CODE
            }
        }
    }
}

/// Output of one tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub output: StationOutput,
    pub transition: Option<Transition>,
}

/// Sanity-driven NORMAL/POSSESSED machine
pub struct PossessionMachine {
    state: PossessionState,
    sanity: SanityEngine,
    matcher: RecoveryMatcher,
    timeout: Duration,
    /// Timer armed on entry, cleared on exit
    armed_timer: Option<TimerToken>,
    next_token: u64,
    sink: Arc<dyn EffectSink>,
}

impl std::fmt::Debug for PossessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PossessionMachine")
            .field("state", &self.state)
            .field("sanity", &self.sanity)
            .field("armed_timer", &self.armed_timer)
            .finish()
    }
}

impl PossessionMachine {
    /// Build from a validated config; fails fast on bad values
    pub fn new(config: &StationConfig, now: Instant, sink: Arc<dyn EffectSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: PossessionState::default(),
            sanity: SanityEngine::new(config.max_sanity, config.decay_rate, now)?,
            matcher: RecoveryMatcher::new(config.recovery_code.clone())?,
            timeout: config.possession_timeout(),
            armed_timer: None,
            next_token: 0,
            sink,
        })
    }

    /// Advance sanity and apply any due transition
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let transition = match self.state.mode {
            PossessionMode::Normal => {
                self.sanity.tick(now);
                if self.sanity.is_depleted() {
                    Some(self.enter(now))
                } else {
                    None
                }
            }

            // Sanity is frozen while possessed; only the deadline matters
            PossessionMode::Possessed => match self.state.recovery_deadline {
                Some(deadline) if now >= deadline => Some(self.exit(ExitCause::Timeout, now)),
                _ => None,
            },
        };

        let reason = match transition {
            Some(transition) => transition.reason(),
            None => self.steady_reason(),
        };

        TickOutcome {
            output: self.output(now, reason),
            transition,
        }
    }

    /// Auto-recovery timer callback. Inert unless `token` is the armed one.
    pub fn fire_timer(&mut self, token: TimerToken, now: Instant) -> Option<Transition> {
        if self.state.mode != PossessionMode::Possessed || self.armed_timer != Some(token) {
            debug!(?token, mode = %self.state.mode, "Stale recovery timer ignored");
            return None;
        }
        Some(self.exit(ExitCause::Timeout, now))
    }

    /// Feed one recovery symbol; exits on a full match
    pub fn submit_symbol(
        &mut self,
        symbol: RecoverySymbol,
        now: Instant,
    ) -> (SubmitOutcome, Option<Transition>) {
        if self.state.mode != PossessionMode::Possessed {
            return (SubmitOutcome::Ignored, None);
        }
        match self.matcher.submit(symbol) {
            SubmitOutcome::Matched => {
                let transition = self.exit(ExitCause::RecoveryCode, now);
                (SubmitOutcome::Matched, Some(transition))
            }
            outcome => (outcome, None),
        }
    }

    fn enter(&mut self, now: Instant) -> Transition {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        let deadline = now + self.timeout;

        self.state = PossessionState {
            mode: PossessionMode::Possessed,
            recovery_deadline: Some(deadline),
            entered_at: Some(now),
        };
        self.armed_timer = Some(token);
        self.matcher.activate();

        info!(timeout_ms = self.timeout.as_millis() as u64, "Upside Down breach - signal hijacked");
        self.sink.emit(&StationEvent::PossessionEntered {
            at: Utc::now(),
            timeout_ms: self.timeout.as_millis() as u64,
        });

        Transition::Entered { token, deadline }
    }

    fn exit(&mut self, cause: ExitCause, now: Instant) -> Transition {
        let possessed_for = self
            .state
            .entered_at
            .map(|t| now.saturating_duration_since(t).as_millis() as u64)
            .unwrap_or(0);

        self.state = PossessionState::default();
        self.armed_timer = None;
        self.matcher.deactivate();
        self.sanity.reset(now);

        let transition = Transition::Exited { cause };
        info!(
            reason = transition.reason().code(),
            possessed_ms = possessed_for,
            "Portal sealed - sanity restored"
        );
        self.sink.emit(&StationEvent::PossessionExited { cause });

        transition
    }

    // -------------------------------------------------------------------------
    // Sanity pass-through. A write here is seen by the next tick.
    // -------------------------------------------------------------------------

    pub fn damage(&mut self, amount: f64) -> f64 {
        self.sanity.damage(amount)
    }

    pub fn heal(&mut self, amount: f64) -> f64 {
        self.sanity.heal(amount)
    }

    pub fn pause(&mut self) {
        self.sanity.pause();
    }

    pub fn resume(&mut self, now: Instant) {
        self.sanity.resume(now);
    }

    pub fn set_decay_rate(&mut self, rate: f64) -> Result<()> {
        self.sanity.set_decay_rate(rate)
    }

    // -------------------------------------------------------------------------
    // Read-only views
    // -------------------------------------------------------------------------

    pub fn mode(&self) -> PossessionMode {
        self.state.mode
    }

    pub fn state(&self) -> &PossessionState {
        &self.state
    }

    pub fn sanity(&self) -> &SanityEngine {
        &self.sanity
    }

    pub fn sanity_value(&self) -> f64 {
        self.sanity.value()
    }

    pub fn recovery_progress(&self) -> RecoveryProgress {
        self.matcher.progress()
    }

    pub fn recovery_deadline(&self) -> Option<Instant> {
        self.state.recovery_deadline
    }

    pub fn armed_timer(&self) -> Option<TimerToken> {
        self.armed_timer
    }

    /// Time left before auto-recovery
    pub fn recovery_remaining(&self, now: Instant) -> Option<Duration> {
        self.state
            .recovery_deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Current output without advancing time
    pub fn current_output(&self, now: Instant) -> StationOutput {
        self.output(now, self.steady_reason())
    }

    /// Output describing a transition that just happened
    pub fn transition_output(&self, transition: Transition, now: Instant) -> StationOutput {
        self.output(now, transition.reason())
    }

    fn steady_reason(&self) -> ReasonCode {
        match self.state.mode {
            PossessionMode::Possessed => ReasonCode::R102_STATE_POSSESSED,
            PossessionMode::Normal if self.sanity.is_paused() => ReasonCode::R101_SANITY_PAUSED,
            PossessionMode::Normal => ReasonCode::R101_SANITY_DECAYING,
        }
    }

    fn output(&self, now: Instant, reason: ReasonCode) -> StationOutput {
        StationOutput::new(
            self.sanity.value(),
            self.state.mode,
            self.recovery_remaining(now).map(|d| d.as_millis() as u64),
            self.matcher.progress().entered_count,
            reason,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
