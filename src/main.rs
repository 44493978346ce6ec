//! SpeechBridge demo front end
//!
//! Reads raw 16-bit little-endian mono PCM on stdin (e.g. from `arecord -f
//! S16_LE -r 16000 -c 1 -t raw`) and prints one JSON line per recognition
//! event on stdout. Logs go to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use speechbridge::engine::{AudioSource, ChannelSource};
use speechbridge::{BridgeError, SessionManager, VoskEngine};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the Vosk model directory
    model: PathBuf,

    /// Audio sample rate in Hz
    #[arg(short, long, default_value_t = 16000.0)]
    sample_rate: f32,

    /// Restrict recognition to these phrases (repeatable)
    #[arg(short, long)]
    grammar: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🎤 speechbridge v{} starting...", env!("CARGO_PKG_VERSION"));

    // The session pulls audio through this channel; stdin feeds it below.
    let (audio_tx, audio_rx) = mpsc::channel::<Vec<i16>>();
    let mut audio_slot = Some(audio_rx);
    let engine = VoskEngine::new(Box::new(move |_rate| {
        audio_slot
            .take()
            .map(|rx| Box::new(ChannelSource::new(rx)) as Box<dyn AudioSource>)
            .ok_or_else(|| BridgeError::Service("stdin audio source already in use".into()))
    }));

    let mut manager = SessionManager::new(engine);

    let (result_tx, result_rx) = mpsc::channel();
    let (partial_tx, partial_rx) = mpsc::channel();
    let (error_tx, error_rx) = mpsc::channel();
    manager.events().attach_result(result_tx);
    manager.events().attach_partial(partial_tx);
    manager.events().attach_error(error_tx);

    let printers = vec![
        spawn_printer(result_rx, |text| json!({ "type": "result", "text": text })),
        spawn_printer(partial_rx, |text| json!({ "type": "partial", "text": text })),
        thread::spawn(move || {
            for event in error_rx {
                println!(
                    "{}",
                    json!({ "type": "error", "code": event.code, "message": event.message })
                );
            }
        }),
    ];

    manager.create_model(&args.model)?;
    let grammar = if args.grammar.is_empty() {
        None
    } else {
        Some(args.grammar.clone())
    };
    manager.create_recognizer(args.sample_rate, grammar)?;
    manager.init_session()?;
    info!("✅ listening - pipe raw S16LE mono PCM to stdin");

    pump_stdin(audio_tx);

    // Let the loop finalize the last utterance before tearing down.
    thread::sleep(Duration::from_millis(300));
    manager.detach();
    for printer in printers {
        let _ = printer.join();
    }

    info!("👋 stdin closed, shutting down");
    Ok(())
}

fn spawn_printer(
    rx: Receiver<String>,
    line: fn(&str) -> serde_json::Value,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for text in rx {
            println!("{}", line(&text));
        }
    })
}

/// Read stdin to EOF, forwarding PCM chunks. Dropping the sender closes the
/// session's audio source.
fn pump_stdin(audio_tx: mpsc::Sender<Vec<i16>>) {
    let mut stdin = std::io::stdin().lock();
    let mut buf = [0u8; 3200];
    loop {
        match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let samples: Vec<i16> = buf[..n]
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect();
                if audio_tx.send(samples).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("stdin read failed: {e}");
                break;
            }
        }
    }
}
