//! Sanity Engine: continuously decaying meter
//!
//! value(t) = max(0, value(t0) - rate * (t - t0)), charged lazily on tick.
//! Ticks are time-delta based, so the trajectory is independent of how
//! often `tick` is called.

use std::time::Instant;
use crate::error::{Result, StationError};
use crate::types::{SanityLevel, SanityState};

/// Decaying sanity meter
#[derive(Debug, Clone)]
pub struct SanityEngine {
    state: SanityState,
}

impl SanityEngine {
    /// Create a full meter. Rejects `max_value <= 0` and `decay_rate <= 0`.
    pub fn new(max_value: f64, decay_rate: f64, now: Instant) -> Result<Self> {
        if !(max_value > 0.0) || !max_value.is_finite() {
            return Err(StationError::InvalidMaxSanity(max_value));
        }
        if !(decay_rate > 0.0) || !decay_rate.is_finite() {
            return Err(StationError::InvalidDecayRate(decay_rate));
        }
        Ok(Self {
            state: SanityState::new(max_value, decay_rate, now),
        })
    }

    /// Charge decay since the last update and return the new value
    pub fn tick(&mut self, now: Instant) -> f64 {
        if self.state.paused {
            return self.state.value;
        }

        // an out-of-order `now` charges nothing and never moves the baseline back
        let elapsed = now.saturating_duration_since(self.state.last_update).as_secs_f64();
        self.state.last_update = self.state.last_update.max(now);
        self.state.value = (self.state.value - self.state.decay_rate_per_second * elapsed).max(0.0);

        self.state.value
    }

    /// Refill to max
    pub fn reset(&mut self, now: Instant) {
        self.state.value = self.state.max_value;
        self.state.last_update = now;
    }

    /// Subtract `amount` (negative treated as zero)
    pub fn damage(&mut self, amount: f64) -> f64 {
        self.state.value = self.state.clamp(self.state.value - amount.max(0.0));
        self.state.value
    }

    /// Add `amount` (negative treated as zero)
    pub fn heal(&mut self, amount: f64) -> f64 {
        self.state.value = self.state.clamp(self.state.value + amount.max(0.0));
        self.state.value
    }

    /// Overwrite the value, clamped
    pub fn set_value(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.state.value = self.state.clamp(value);
    }

    /// Change the live decay rate (settings panel)
    pub fn set_decay_rate(&mut self, decay_rate: f64) -> Result<()> {
        if !(decay_rate > 0.0) || !decay_rate.is_finite() {
            return Err(StationError::InvalidDecayRate(decay_rate));
        }
        self.state.decay_rate_per_second = decay_rate;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.state.paused = true;
    }

    /// Resume without charging the paused interval
    pub fn resume(&mut self, now: Instant) {
        self.state.paused = false;
        self.state.last_update = now;
    }

    pub fn value(&self) -> f64 {
        self.state.value
    }

    pub fn max_value(&self) -> f64 {
        self.state.max_value
    }

    pub fn decay_rate(&self) -> f64 {
        self.state.decay_rate_per_second
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_depleted(&self) -> bool {
        self.state.value <= 0.0
    }

    pub fn level(&self) -> SanityLevel {
        SanityLevel::from_value(self.state.value)
    }

    /// Read-only snapshot
    pub fn state(&self) -> &SanityState {
        &self.state
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn engine(rate: f64) -> (SanityEngine, Instant) {
        let t0 = Instant::now();
        (SanityEngine::new(100.0, rate, t0).unwrap(), t0)
    }

    #[test]
    fn test_starts_full() {
        let (engine, _) = engine(0.5);
        assert_eq!(engine.value(), 100.0);
        assert_eq!(engine.level(), SanityLevel::Stable);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let now = Instant::now();
        assert!(matches!(
            SanityEngine::new(100.0, 0.0, now),
            Err(StationError::InvalidDecayRate(_))
        ));
        assert!(matches!(
            SanityEngine::new(-5.0, 0.5, now),
            Err(StationError::InvalidMaxSanity(_))
        ));
    }

    #[test]
    fn test_tick_decays_by_elapsed_time() {
        let (mut engine, t0) = engine(0.5);
        let value = engine.tick(t0 + Duration::from_secs(10));
        assert!((value - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_granularity_independent() {
        let (mut fine, t0) = engine(2.0);
        let mut coarse = fine.clone();

        for i in 1..=10 {
            fine.tick(t0 + Duration::from_millis(100 * i));
        }
        coarse.tick(t0 + Duration::from_secs(1));

        assert!((fine.value() - coarse.value()).abs() < 1e-9);
        assert!((fine.value() - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_stale_tick_does_not_recharge_interval() {
        let (mut engine, t0) = engine(0.5);
        engine.tick(t0 + Duration::from_secs(10));
        assert_eq!(engine.tick(t0 + Duration::from_secs(5)), engine.value());
        let value = engine.tick(t0 + Duration::from_secs(10));
        assert!((value - 95.0).abs() < 1e-9, "value = {}", value);

        let value = engine.tick(t0 + Duration::from_secs(12));
        assert!((value - 94.0).abs() < 1e-9, "value = {}", value);
    }

    #[test]
    fn test_tick_floors_at_zero() {
        let (mut engine, t0) = engine(10.0);
        assert_eq!(engine.tick(t0 + Duration::from_secs(60)), 0.0);
        assert!(engine.is_depleted());
    }

    #[test]
    fn test_pause_and_resume_skip_paused_interval() {
        let (mut engine, t0) = engine(1.0);
        engine.tick(t0 + Duration::from_secs(5)); // 95
        engine.pause();
        assert_eq!(engine.tick(t0 + Duration::from_secs(50)), 95.0);

        engine.resume(t0 + Duration::from_secs(50));
        let value = engine.tick(t0 + Duration::from_secs(52));
        assert!((value - 93.0).abs() < 1e-9);
    }

    #[test]
    fn test_damage_heal_clamp() {
        let (mut engine, _) = engine(0.5);
        assert_eq!(engine.heal(50.0), 100.0);
        assert_eq!(engine.damage(30.0), 70.0);
        assert_eq!(engine.damage(500.0), 0.0);
        assert_eq!(engine.heal(-10.0), 0.0);
        assert_eq!(engine.heal(25.0), 25.0);
        assert_eq!(engine.damage(-10.0), 25.0);
    }

    #[test]
    fn test_reset_refills_and_rebases() {
        let (mut engine, t0) = engine(1.0);
        engine.tick(t0 + Duration::from_secs(40));
        engine.reset(t0 + Duration::from_secs(40));
        assert_eq!(engine.value(), 100.0);
        let value = engine.tick(t0 + Duration::from_secs(41));
        assert!((value - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_value_and_rate() {
        let (mut engine, t0) = engine(1.0);
        engine.set_value(150.0);
        assert_eq!(engine.value(), 100.0);
        engine.set_value(-1.0);
        assert_eq!(engine.value(), 0.0);

        engine.set_value(50.0);
        engine.set_decay_rate(5.0).unwrap();
        let value = engine.tick(t0 + Duration::from_secs(2));
        assert!((value - 40.0).abs() < 1e-9);
        assert!(engine.set_decay_rate(0.0).is_err());
        assert_eq!(engine.decay_rate(), 5.0);
    }

    #[test]
    fn test_value_stays_in_bounds_under_mixed_ops() {
        let (mut engine, t0) = engine(3.0);
        let mut now = t0;
        // deterministic pseudo-random walk
        let mut seed: u64 = 0x5eed;
        for _ in 0..2000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let amount = (seed >> 33) as f64 / (1u64 << 31) as f64 * 80.0;
            match seed % 5 {
                0 => { engine.damage(amount); }
                1 => { engine.heal(amount); }
                2 => {
                    now += Duration::from_millis((seed >> 40) % 5000);
                    engine.tick(now);
                }
                3 => engine.reset(now),
                _ => engine.set_value(amount * 2.0 - 40.0),
            }
            assert!(engine.value() >= 0.0 && engine.value() <= 100.0);
        }
    }
}
