//! Integration tests for the sanity/possession machine
//!
//! Drives the machine with a hand-advanced clock at the 100ms cadence

use std::sync::Arc;
use std::time::Duration;

use numberstation::core::{
    Clock, EventLog, ManualClock, PossessionMachine, SanityEngine, StationEvent, SubmitOutcome,
    Transition,
};
use numberstation::types::{ExitCause, PossessionMode, RecoverySymbol, SanityLevel};
use numberstation::{StationConfig, TICK_INTERVAL_MS};

fn machine(decay_rate: f64, clock: &ManualClock) -> (PossessionMachine, Arc<EventLog>) {
    let log = Arc::new(EventLog::new());
    let config = StationConfig { decay_rate, ..Default::default() };
    let machine = PossessionMachine::new(&config, clock.now(), log.clone()).unwrap();
    (machine, log)
}

/// Step the machine at the driver cadence until `until` has elapsed
fn run_for(machine: &mut PossessionMachine, clock: &ManualClock, until: Duration) -> Vec<Transition> {
    let step = Duration::from_millis(TICK_INTERVAL_MS);
    let mut transitions = Vec::new();
    while clock.elapsed() + step <= until {
        clock.advance(step);
        if let Some(t) = machine.tick(clock.now()).transition {
            transitions.push(t);
        }
    }
    transitions
}

fn exits(log: &EventLog) -> usize {
    log.snapshot()
        .iter()
        .filter(|e| matches!(e, StationEvent::PossessionExited { .. }))
        .count()
}

/// Decay is identical whether ticked every 100ms or every 5s
#[test]
fn test_decay_granularity() {
    let clock = ManualClock::new();
    let t0 = clock.now();
    let mut fine = SanityEngine::new(100.0, 0.5, t0).unwrap();
    let mut coarse = fine.clone();

    for i in 1..=600 {
        fine.tick(t0 + Duration::from_millis(100 * i));
    }
    for i in 1..=12 {
        coarse.tick(t0 + Duration::from_secs(5 * i));
    }

    assert!((fine.value() - coarse.value()).abs() < 1e-9);
    assert!((fine.value() - 70.0).abs() < 1e-9);
    assert_eq!(fine.level(), SanityLevel::Critical);
}

/// Full cycle: decay → possession → 30s auto-recovery → decay again
#[test]
fn test_full_possession_cycle_auto_recovery() {
    let clock = ManualClock::new();
    let (mut machine, log) = machine(10.0, &clock);

    // ~10s to empty at 10/s
    let transitions = run_for(&mut machine, &clock, Duration::from_millis(10_500));
    assert_eq!(transitions.len(), 1);
    assert!(matches!(transitions[0], Transition::Entered { .. }));
    assert_eq!(machine.mode(), PossessionMode::Possessed);

    let entered_at = machine.state().entered_at.unwrap();
    assert_eq!(machine.recovery_deadline(), Some(entered_at + Duration::from_secs(30)));

    // Just before the deadline: still possessed, no extra entries
    let until = (entered_at + Duration::from_millis(29_900)) - (clock.now() - clock.elapsed());
    assert!(run_for(&mut machine, &clock, until).is_empty());
    assert_eq!(machine.mode(), PossessionMode::Possessed);

    // The tick at the deadline recovers
    clock.advance(Duration::from_millis(TICK_INTERVAL_MS));
    let outcome = machine.tick(clock.now());
    assert_eq!(outcome.transition, Some(Transition::Exited { cause: ExitCause::Timeout }));
    assert_eq!(clock.now(), entered_at + Duration::from_secs(30));
    assert_eq!(machine.sanity_value(), 100.0);
    assert_eq!(exits(&log), 1);

    // Decay resumes from full
    clock.advance(Duration::from_secs(1));
    machine.tick(clock.now());
    assert!((machine.sanity_value() - 90.0).abs() < 1e-9);
}

/// Recovery code beats the timer; the timer's later fire does nothing
#[test]
fn test_recovery_code_wins_race() {
    let clock = ManualClock::new();
    let (mut machine, log) = machine(10.0, &clock);
    run_for(&mut machine, &clock, Duration::from_millis(10_500));
    let token = machine.armed_timer().unwrap();

    clock.advance(Duration::from_secs(3));
    let code = RecoverySymbol::default_code();
    for symbol in &code[..9] {
        let (outcome, transition) = machine.submit_symbol(symbol.clone(), clock.now());
        assert_eq!(outcome, SubmitOutcome::Pending);
        assert!(transition.is_none());
    }
    assert_eq!(machine.recovery_progress().entered_count, 9);

    let (outcome, transition) = machine.submit_symbol(code[9].clone(), clock.now());
    assert_eq!(outcome, SubmitOutcome::Matched);
    assert_eq!(transition, Some(Transition::Exited { cause: ExitCause::RecoveryCode }));
    assert_eq!(machine.sanity_value(), 100.0);

    clock.advance(Duration::from_secs(30));
    assert_eq!(machine.fire_timer(token, clock.now()), None);
    assert_eq!(exits(&log), 1);
}

/// 9 right + 1 wrong + the 10th never matches a stale window
#[test]
fn test_sliding_window_semantics() {
    let clock = ManualClock::new();
    let (mut machine, _) = machine(10.0, &clock);
    run_for(&mut machine, &clock, Duration::from_millis(10_500));

    let code = RecoverySymbol::default_code();
    for symbol in &code[..9] {
        machine.submit_symbol(symbol.clone(), clock.now());
    }
    let (outcome, _) = machine.submit_symbol(RecoverySymbol::Key('Q'), clock.now());
    assert_eq!(outcome, SubmitOutcome::Pending);
    let (outcome, _) = machine.submit_symbol(code[9].clone(), clock.now());
    assert_eq!(outcome, SubmitOutcome::Pending);
    assert_eq!(machine.mode(), PossessionMode::Possessed);

    // a fresh full code still works afterwards
    let mut last = SubmitOutcome::Pending;
    for symbol in code {
        last = machine.submit_symbol(symbol, clock.now()).0;
    }
    assert_eq!(last, SubmitOutcome::Matched);
    assert_eq!(machine.mode(), PossessionMode::Normal);
}

/// Pausing stops the approach to possession entirely
#[test]
fn test_paused_machine_never_possessed() {
    let clock = ManualClock::new();
    let (mut machine, log) = machine(10.0, &clock);
    run_for(&mut machine, &clock, Duration::from_secs(5));
    machine.pause();

    run_for(&mut machine, &clock, Duration::from_secs(60));
    assert_eq!(machine.mode(), PossessionMode::Normal);
    assert!((machine.sanity_value() - 50.0).abs() < 1e-6);
    assert!(log.snapshot().is_empty());

    machine.resume(clock.now());
    run_for(&mut machine, &clock, Duration::from_secs(66));
    assert_eq!(machine.mode(), PossessionMode::Possessed);
}
