//! Integration tests for the running session
//!
//! Uses tokio's paused clock so the 100ms driver, the 30s recovery timer
//! and playback all advance deterministically.

use std::sync::Arc;
use std::time::Duration;

use numberstation::core::{
    EventLog, JsonDirStore, KeyValueStore, MemoryStore, StationEvent, StationSession,
    SubmitOutcome, MESSAGES_KEY, STATS_KEY,
};
use numberstation::types::{
    ExitCause, PossessionMode, RecoverySymbol, SessionStats, TransmittedMessage,
};
use numberstation::StationConfig;
use pretty_assertions::assert_eq;
use tokio::time::sleep;

fn fast_config() -> StationConfig {
    StationConfig { decay_rate: 10.0, ..Default::default() }
}

fn session_with(config: StationConfig) -> (StationSession, Arc<MemoryStore>, Arc<EventLog>) {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(EventLog::new());
    let session = StationSession::new(config, store.clone(), log.clone()).unwrap();
    (session, store, log)
}

fn exit_causes(log: &EventLog) -> Vec<ExitCause> {
    log.snapshot()
        .into_iter()
        .filter_map(|e| match e {
            StationEvent::PossessionExited { cause } => Some(cause),
            _ => None,
        })
        .collect()
}

fn entries(log: &EventLog) -> usize {
    log.snapshot()
        .iter()
        .filter(|e| matches!(e, StationEvent::PossessionEntered { .. }))
        .count()
}

/// Decay to zero, stay possessed for 30s, recover on the timer
#[tokio::test(start_paused = true)]
async fn test_possession_auto_recovers_after_timeout() {
    let (session, store, log) = session_with(fast_config());
    session.start();

    sleep(Duration::from_millis(9_500)).await;
    assert_eq!(session.mode(), PossessionMode::Normal);
    assert!(session.sanity_value() > 0.0);

    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(session.mode(), PossessionMode::Possessed);
    assert_eq!(entries(&log), 1);

    let remaining = session.status().recovery_remaining_ms.unwrap();
    assert!(remaining <= 30_000 && remaining >= 29_000, "remaining = {}", remaining);

    // Still possessed just short of the deadline; sanity does not move
    sleep(Duration::from_millis(28_500)).await;
    assert_eq!(session.mode(), PossessionMode::Possessed);
    assert_eq!(session.sanity_value(), 0.0);

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(session.mode(), PossessionMode::Normal);
    assert_eq!(exit_causes(&log), vec![ExitCause::Timeout]);
    assert!(session.sanity_value() > 80.0);

    let stats = session.stats();
    assert_eq!(stats.possessions, 1);
    assert_eq!(stats.recoveries, 1);

    let persisted: SessionStats = serde_json::from_str(&store.get(STATS_KEY).unwrap()).unwrap();
    assert_eq!(persisted.recoveries, 1);

    session.stop();
}

/// The recovery code exits at once and the 30s timer never fires a second exit
#[tokio::test(start_paused = true)]
async fn test_recovery_code_cancels_timer() {
    let (session, _, log) = session_with(fast_config());
    session.start();
    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(session.mode(), PossessionMode::Possessed);

    sleep(Duration::from_secs(5)).await;
    let mut last = SubmitOutcome::Ignored;
    for symbol in RecoverySymbol::default_code() {
        last = session.submit_symbol(symbol);
    }
    assert_eq!(last, SubmitOutcome::Matched);
    assert_eq!(session.mode(), PossessionMode::Normal);
    assert_eq!(session.sanity_value(), 100.0);

    // keep sanity well clear of zero while the old deadline passes
    session.set_decay_rate(0.1).unwrap();
    sleep(Duration::from_secs(40)).await;

    assert_eq!(session.mode(), PossessionMode::Normal);
    assert_eq!(exit_causes(&log), vec![ExitCause::RecoveryCode]);
    assert_eq!(session.stats().recoveries, 1);

    session.stop();
}

/// Symbols typed while NORMAL are ignored
#[tokio::test(start_paused = true)]
async fn test_symbols_ignored_when_normal() {
    let (session, _, log) = session_with(fast_config());
    session.start();

    for symbol in RecoverySymbol::default_code() {
        assert_eq!(session.submit_symbol(symbol), SubmitOutcome::Ignored);
    }
    assert_eq!(session.recovery_progress().entered_count, 0);
    assert!(exit_causes(&log).is_empty());

    session.stop();
}

/// After stop nothing mutates state any more
#[tokio::test(start_paused = true)]
async fn test_stop_cancels_all_tasks() {
    let (session, _, log) = session_with(fast_config());
    session.start();
    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(session.mode(), PossessionMode::Possessed);

    session.transmit("SOS", None);
    assert!(session.playback().is_playing);

    session.stop();
    assert!(!session.is_running());
    assert!(!session.playback().is_playing);

    let before = log.snapshot().len();
    sleep(Duration::from_secs(60)).await;

    assert_eq!(session.mode(), PossessionMode::Possessed);
    assert!(exit_causes(&log).is_empty());
    // only the PlaybackCancelled emitted by stop itself
    assert_eq!(log.snapshot().len(), before);
    assert!(log.snapshot().contains(&StationEvent::PlaybackCancelled));
}

/// Pausing holds sanity still across a long wait
#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_rebase() {
    let (session, _, _) = session_with(fast_config());
    session.start();
    sleep(Duration::from_millis(5_050)).await;
    session.pause();
    let held = session.sanity_value();

    sleep(Duration::from_secs(120)).await;
    assert_eq!(session.sanity_value(), held);
    assert_eq!(session.mode(), PossessionMode::Normal);

    session.resume();
    sleep(Duration::from_millis(1_050)).await;
    let after = session.sanity_value();
    assert!(held - after > 9.0 && held - after < 11.0, "held {} after {}", held, after);

    session.stop();
}

/// Transmit archives, updates stats and plays through to the end
#[tokio::test(start_paused = true)]
async fn test_transmit_archives_and_plays() {
    let (session, store, log) = session_with(StationConfig::default());

    let message = session.transmit("sos", Some("Joyce")).unwrap();
    assert_eq!(message.morse_code, "... --- ...");
    assert_eq!(message.contact_label, "Joyce");
    assert!(session.playback().is_playing);

    // second play while busy is a no-op
    assert!(!session.replay("..."));

    sleep(Duration::from_millis(6_000 + 50)).await;
    assert!(!session.playback().is_playing);

    let events = log.snapshot();
    let active = events
        .iter()
        .filter(|e| matches!(e, StationEvent::SignalActive { possessed: false, .. }))
        .count();
    let inactive = events
        .iter()
        .filter(|e| matches!(e, StationEvent::SignalInactive { .. }))
        .count();
    assert_eq!(active, 9);
    assert_eq!(inactive, 9);
    assert_eq!(events.last(), Some(&StationEvent::PlaybackFinished));

    let stats = session.stats();
    assert_eq!(stats.messages_sent, 1);
    assert_eq!(stats.longest_message, 3);

    let archived: Vec<TransmittedMessage> =
        serde_json::from_str(&store.get(MESSAGES_KEY).unwrap()).unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].text, "sos");

    // replay once idle
    assert!(session.replay(&archived[0].morse_code));
}

/// Text with no Morse equivalent is neither archived nor counted
#[tokio::test(start_paused = true)]
async fn test_transmit_unmappable_text_records_nothing() {
    let (session, store, log) = session_with(StationConfig::default());

    assert_eq!(session.transmit("@@@", None), None);
    assert!(session.messages().is_empty());
    assert_eq!(session.stats().messages_sent, 0);
    assert_eq!(session.stats().longest_message, 0);
    assert!(!session.playback().is_playing);
    assert_eq!(store.get(MESSAGES_KEY), None);
    assert!(log.snapshot().is_empty());
}

/// With sound off the effect sink stays silent; subscribers still see events
#[tokio::test(start_paused = true)]
async fn test_sound_disabled_mutes_effects_only() {
    let config = StationConfig { sound_enabled: false, ..Default::default() };
    let (session, _, log) = session_with(config);
    let mut rx = session.subscribe();

    session.transmit("E", None);
    sleep(Duration::from_millis(500)).await;

    assert!(log.snapshot().is_empty());
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    assert!(seen.iter().any(|e| matches!(e, StationEvent::SignalActive { .. })));
    assert_eq!(seen.last(), Some(&StationEvent::PlaybackFinished));
}

/// Auto-save off keeps the store empty
#[tokio::test(start_paused = true)]
async fn test_auto_save_disabled() {
    let config = StationConfig { auto_save: false, ..fast_config() };
    let (session, store, _) = session_with(config);
    session.start();
    session.transmit("HI", None);
    sleep(Duration::from_millis(10_500)).await;
    session.stop();

    assert_eq!(store.get(STATS_KEY), None);
    assert_eq!(store.get(MESSAGES_KEY), None);
    assert_eq!(session.stats().messages_sent, 1);
}

/// Stats and archive land on disk as JSON files
#[tokio::test(start_paused = true)]
async fn test_json_dir_store_persists_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonDirStore::new(dir.path()));
    let session =
        StationSession::new(fast_config(), store.clone() as Arc<dyn KeyValueStore>, Arc::new(EventLog::new()))
            .unwrap();

    session.start();
    session.transmit("RELAY", Some("Hopper"));
    sleep(Duration::from_secs(2)).await;
    session.stop();

    let stats: SessionStats =
        serde_json::from_str(&std::fs::read_to_string(store.path_for(STATS_KEY)).unwrap()).unwrap();
    assert_eq!(stats.messages_sent, 1);
    assert_eq!(stats.time_in_app_secs, 2);

    let messages: Vec<TransmittedMessage> =
        serde_json::from_str(&std::fs::read_to_string(store.path_for(MESSAGES_KEY)).unwrap()).unwrap();
    assert_eq!(messages[0].contact_label, "Hopper");
}

/// An invalid config is rejected before anything starts
#[test]
fn test_invalid_config_rejected() {
    let config = StationConfig { decay_rate: -1.0, ..Default::default() };
    let result = StationSession::new(config, Arc::new(MemoryStore::new()), Arc::new(EventLog::new()));
    assert!(result.is_err());
}
