//! WSQK number-station terminal
//!
//! Usage:
//!   numberstation --text "your text here"        # Encode once
//!   numberstation --decode "... --- ..."         # Decode once
//!   numberstation --interactive                  # Live terminal
//!   numberstation --text "sos" --json            # JSON output

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use numberstation::core as station;
use numberstation::core::{
    EffectSink, JsonDirStore, KeyValueStore, MemoryStore, StationEvent, StationSession,
    SubmitOutcome,
};
use numberstation::types::{PossessionMode, RecoverySymbol, SlotStatus};
use numberstation::{StationConfig, StationError, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "numberstation",
    version = VERSION,
    about = "WSQK number station - Morse relay with a sanity meter",
    long_about = "Type text to transmit it as Morse. Sanity decays while the relay\n\
                  is open; at zero the signal is hijacked (POSSESSED) for 30 seconds\n\
                  unless the recovery sequence is entered.\n\n\
                  Interactive commands:\n  \
                  <text>              Transmit\n  \
                  <morse>             Decode (lines of . - / only)\n  \
                  :recover <symbols>  Enter recovery symbols (up down left right b a)\n  \
                  :status :stats :archive :replay :cancel\n  \
                  :damage N  :heal N  :pause  :resume  :rate N  :to NAME\n  \
                  quit"
)]
struct Args {
    /// Text to encode (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Morse to decode (single mode)
    #[arg(short, long)]
    decode: Option<String>,

    /// Interactive terminal mode
    #[arg(short, long)]
    interactive: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show timing breakdown
    #[arg(long)]
    verbose: bool,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sanity decay, points per second
    #[arg(long)]
    decay_rate: Option<f64>,

    /// Directory for stats and message archive (default: in memory)
    #[arg(long)]
    stats_dir: Option<PathBuf>,

    /// Mute beeps and possession sounds
    #[arg(long)]
    no_sound: bool,

    /// Do not write stats or the message archive
    #[arg(long)]
    no_autosave: bool,
}

/// Audio stand-in: rings the terminal bell on possession
struct TerminalBell;

impl EffectSink for TerminalBell {
    fn emit(&self, event: &StationEvent) {
        if matches!(event, StationEvent::PossessionEntered { .. }) {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if let Some(ref text) = args.text {
        run_encode(text, &args)
    } else if let Some(ref morse) = args.decode {
        run_decode(morse, &args)
    } else if args.interactive {
        run_interactive(&args).await
    } else {
        // Default to interactive if no mode specified
        run_interactive(&args).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let debug_enabled = env::var("NUMBERSTATION_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<StationConfig, StationError> {
    let mut config = match args.config {
        Some(ref path) => StationConfig::from_json_file(path)?,
        None => StationConfig::default(),
    };
    if let Some(rate) = args.decay_rate {
        config.decay_rate = rate;
    }
    if let Some(ref dir) = args.stats_dir {
        config.stats_dir = Some(dir.clone());
    }
    if args.no_sound {
        config.sound_enabled = false;
    }
    if args.no_autosave {
        config.auto_save = false;
    }
    config.validate()?;
    Ok(config)
}

/// Encode a single text
fn run_encode(text: &str, args: &Args) -> Result<(), StationError> {
    let morse = station::encode(text);
    let timings = station::timings_for(&morse);
    let total_ms = station::total_duration_ms(&timings);

    if args.json {
        #[derive(serde::Serialize)]
        struct EncodeOutput<'a> {
            text: &'a str,
            morse: &'a str,
            timings: &'a [numberstation::types::MorseTimingEvent],
            total_ms: u64,
        }
        let out = EncodeOutput { text, morse: &morse, timings: &timings, total_ms };
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        return Ok(());
    }

    println!("{}", morse.green());
    if args.verbose {
        for signal in station::schedule(&timings) {
            println!(
                "  {:>6}ms  {:<4} {}ms",
                signal.offset_ms,
                signal.kind.to_string(),
                signal.duration_ms
            );
        }
        println!("  total {:.1}s", total_ms as f64 / 1000.0);
    }
    Ok(())
}

/// Decode a single Morse string
fn run_decode(morse: &str, args: &Args) -> Result<(), StationError> {
    let text = station::decode(morse);
    if args.json {
        println!("{}", serde_json::json!({ "morse": morse, "text": text }));
    } else {
        println!("{}", text.green());
    }
    Ok(())
}

/// Interactive terminal: transmit, decode, recover
async fn run_interactive(args: &Args) -> Result<(), StationError> {
    let config = load_config(args)?;
    let store: Arc<dyn KeyValueStore> = match config.stats_dir {
        Some(ref dir) => Arc::new(JsonDirStore::new(dir)),
        None => Arc::new(MemoryStore::new()),
    };

    let session = StationSession::new(config, store, Arc::new(TerminalBell))?;
    let printer = tokio::spawn(print_events(session.subscribe(), args.json));
    session.start();

    print_header();
    println!("Type a message and press Enter to transmit. Type 'quit' to exit.");
    println!("Frequency locked at 94.5 FM");
    println!();

    let mut contact: Option<String> = None;
    let mut last_morse: Option<String> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", format_prompt(&session));
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            run_command(command, &session, &mut contact, last_morse.as_deref(), args);
        } else if station::looks_like_morse(line) {
            println!("{} {}", "DECODED:".cyan(), station::decode(line).bold());
        } else {
            let Some(message) = session.transmit(line, contact.as_deref()) else {
                println!("{}", "Nothing to transmit".yellow());
                continue;
            };
            if args.json {
                println!("{}", serde_json::to_string(&message).unwrap_or_default());
            } else {
                println!(
                    "{} {}",
                    format!("→ {}:", message.contact_label).green(),
                    message.morse_code
                );
            }
            last_morse = Some(message.morse_code);
        }
    }

    session.stop();
    printer.abort();
    let stats = session.stats();
    println!(
        "\nSession ended. Messages: {} | Possessions: {} | Recoveries: {}",
        stats.messages_sent, stats.possessions, stats.recoveries
    );
    Ok(())
}

fn run_command(
    command: &str,
    session: &StationSession,
    contact: &mut Option<String>,
    last_morse: Option<&str>,
    args: &Args,
) {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let rest: Vec<&str> = parts.collect();
    let amount = || rest.first().and_then(|s| s.parse::<f64>().ok());

    match name {
        "status" | "s" => {
            let output = session.status();
            if args.json {
                println!("{}", serde_json::to_string(&output).unwrap_or_default());
            } else {
                println!("{}", output.render(args.no_color));
            }
        }
        "recover" | "r" => {
            if rest.is_empty() {
                print_recovery_panel(session);
                return;
            }
            for token in &rest {
                match session.submit_symbol(RecoverySymbol::parse(token)) {
                    SubmitOutcome::Ignored => {
                        println!("{}", "No breach in progress".dimmed());
                        return;
                    }
                    SubmitOutcome::Matched => return,
                    SubmitOutcome::Pending => {}
                }
            }
            print_recovery_panel(session);
        }
        "damage" => match amount() {
            Some(n) => println!("sanity={:.1}", session.damage(n)),
            None => println!("{}", "usage: :damage N".yellow()),
        },
        "heal" => match amount() {
            Some(n) => println!("sanity={:.1}", session.heal(n)),
            None => println!("{}", "usage: :heal N".yellow()),
        },
        "rate" => match amount().map(|n| session.set_decay_rate(n)) {
            Some(Ok(())) => println!("Configuration updated"),
            Some(Err(e)) => println!("{}", e.to_string().red()),
            None => println!("{}", "usage: :rate N".yellow()),
        },
        "pause" => {
            session.pause();
            println!("Decay paused");
        }
        "resume" => {
            session.resume();
            println!("Decay resumed");
        }
        "to" => {
            *contact = rest.first().map(|s| s.to_uppercase());
            println!(
                "Contact: {}",
                contact.as_deref().unwrap_or(numberstation::types::BROADCAST_CONTACT)
            );
        }
        "replay" => match last_morse {
            Some(morse) if session.replay(morse) => println!("Replaying archived transmission"),
            Some(_) => println!("{}", "Relay busy".yellow()),
            None => println!("{}", "Nothing to replay".yellow()),
        },
        "cancel" => session.cancel_playback(),
        "stats" => match serde_json::to_string_pretty(&session.stats()) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("{}", e.to_string().red()),
        },
        "archive" => {
            for message in session.messages() {
                println!(
                    "[{}] {} → {}  {}",
                    message.timestamp.format("%H:%M:%S"),
                    message.contact_label,
                    message.text,
                    message.morse_code.dimmed()
                );
            }
        }
        _ => println!("{}", format!("Unknown command: :{}", name).yellow()),
    }
}

/// Print live events: LED glyphs during playback, possession banners
async fn print_events(mut rx: broadcast::Receiver<StationEvent>, json: bool) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if json {
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
            continue;
        }

        match event {
            StationEvent::PossessionEntered { timeout_ms, .. } => {
                println!();
                println!("{}", "⚠ UPSIDE DOWN BREACH - SIGNAL HIJACKED BY ENTITY".red().bold());
                println!(
                    "{}",
                    format!(
                        "Enter recovery sequence with :recover (auto-recovery in {}s)",
                        timeout_ms / 1000
                    )
                    .red()
                );
            }
            StationEvent::PossessionExited { cause } => {
                println!();
                println!("{}", format!("✓ System purged - Portal sealed ({})", cause).green().bold());
                println!("{}", "WSQK relay restored - Sanity stabilized at 100%".green());
            }
            StationEvent::SignalActive { kind, possessed, .. } => {
                let glyph = if kind == numberstation::types::SignalKind::Dot { "•" } else { "▬" };
                let (r, g, b) = kind.color_rgb(possessed);
                print!("{}", glyph.truecolor(r, g, b));
                let _ = std::io::stdout().flush();
            }
            StationEvent::PlaybackFinished | StationEvent::PlaybackCancelled => println!(),
            StationEvent::SignalInactive { .. } => {}
        }
    }
}

fn print_header() {
    println!("{}", "╔════════════════════════════════════════════════════╗".bold());
    println!("{}", format!("║        WSQK Number Station v{}                  ║", VERSION).bold());
    println!("{}", "╚════════════════════════════════════════════════════╝".bold());
    println!();
}

fn format_prompt(session: &StationSession) -> String {
    let output = session.status();
    let label = format!("[{} {:>5.1}]", output.level.warning(), output.sanity);
    match output.mode {
        PossessionMode::Normal => format!("{} {} > ", output.mode.emoji(), label.green()),
        PossessionMode::Possessed => format!("{} {} > ", output.mode.emoji(), label.red().blink()),
    }
}

fn print_recovery_panel(session: &StationSession) {
    let progress = session.recovery_progress();
    let code = session.config().recovery_code.clone();
    let panel: Vec<String> = code
        .iter()
        .zip(progress.slots.iter())
        .map(|(symbol, slot)| {
            let glyph = symbol.glyph();
            match slot {
                SlotStatus::Matched => glyph.green().to_string(),
                SlotStatus::Wrong => glyph.red().to_string(),
                SlotStatus::Pending => glyph.dimmed().to_string(),
            }
        })
        .collect();
    println!("{}  ({}/{})", panel.join(" "), progress.entered_count, progress.total);
}
