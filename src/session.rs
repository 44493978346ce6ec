//! Listening session: the background decode loop
//!
//! Uses a channel-based architecture: the session owns a dedicated worker
//! thread and talks to it through an `mpsc` control channel, so none of the
//! public methods block on decoding. Engine callbacks (via the relay) are
//! emitted from the worker thread only.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{AudioSource, ChunkRead, Decoded, Decoder, RecognitionListener};
use crate::error::{BridgeError, BridgeResult};

/// Pausing discards the in-flight hypothesis: the decoder is reset on both
/// pause and resume, so decoding restarts from empty state. Consumers that
/// need lossless pause must buffer audio upstream.
pub const PAUSE_DISCARDS_HYPOTHESIS: bool = true;

/// How long the loop waits for audio before re-checking control commands.
const AUDIO_POLL: Duration = Duration::from_millis(50);

/// Commands sent to the decode-loop thread
enum LoopCommand {
    Pause,
    Resume,
    Cancel,
    Stop,
    Shutdown,
}

/// A running capture+decode loop bound to one decoder.
///
/// The decoder is shared (not owned): `SessionManager::reset_recognizer`
/// may reset it from the caller's thread while the loop is live.
pub struct ListeningSession {
    control: Sender<LoopCommand>,
    worker: Option<JoinHandle<()>>,
}

impl ListeningSession {
    /// Spawn the decode loop. Returns once the thread is running; never
    /// waits for the first chunk.
    pub fn start(
        decoder: Arc<Mutex<Box<dyn Decoder>>>,
        source: Box<dyn AudioSource>,
        relay: Box<dyn RecognitionListener>,
    ) -> BridgeResult<Self> {
        let (control, commands) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("speech-decode".into())
            .spawn(move || decode_loop(decoder, source, relay, commands))
            .map_err(|e| BridgeError::Service(format!("failed to spawn decode loop: {e}")))?;

        info!("🎙️ listening session started");
        Ok(Self {
            control,
            worker: Some(worker),
        })
    }

    /// Suspend decoding: incoming audio is discarded until `resume`.
    pub fn pause(&self) {
        let _ = self.control.send(LoopCommand::Pause);
    }

    /// Re-enable decoding with the same relay; decoding restarts from empty
    /// state (see [`PAUSE_DISCARDS_HYPOTHESIS`]).
    pub fn resume(&self) {
        let _ = self.control.send(LoopCommand::Resume);
    }

    /// Discard the in-flight hypothesis; the loop keeps running.
    pub fn cancel(&self) {
        let _ = self.control.send(LoopCommand::Cancel);
    }

    /// Finalize the current utterance and flush its result; the loop keeps
    /// running.
    pub fn stop(&self) {
        let _ = self.control.send(LoopCommand::Stop);
    }

    /// Terminate the loop and join the worker thread. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.control.send(LoopCommand::Shutdown);
            if worker.join().is_err() {
                warn!("decode loop panicked before shutdown");
            }
            info!("🛑 listening session shut down");
        }
    }
}

impl Drop for ListeningSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub(crate) fn lock_decoder(
    decoder: &Mutex<Box<dyn Decoder>>,
) -> MutexGuard<'_, Box<dyn Decoder>> {
    // A poisoned lock only means the loop panicked mid-decode; the decoder
    // state itself is still usable for reset/teardown.
    decoder.lock().unwrap_or_else(|p| p.into_inner())
}

fn decode_loop(
    decoder: Arc<Mutex<Box<dyn Decoder>>>,
    mut source: Box<dyn AudioSource>,
    relay: Box<dyn RecognitionListener>,
    commands: Receiver<LoopCommand>,
) {
    let mut paused = false;
    let mut exhausted = false;

    loop {
        if !drain_commands(&commands, &decoder, relay.as_ref(), &mut paused) {
            return;
        }

        if exhausted {
            // No more audio will arrive; park on the control channel so
            // stop/shutdown still work.
            match commands.recv() {
                Ok(cmd) => {
                    if !apply_command(cmd, &decoder, relay.as_ref(), &mut paused) {
                        return;
                    }
                }
                Err(_) => return,
            }
            continue;
        }

        let chunk = match source.read_chunk(AUDIO_POLL) {
            ChunkRead::Chunk(samples) => samples,
            ChunkRead::TimedOut => continue,
            ChunkRead::Closed => {
                debug!("audio source closed, finalizing last utterance");
                let last = lock_decoder(&decoder).finalize();
                if let Some(text) = last {
                    relay.on_final(&text);
                }
                exhausted = true;
                continue;
            }
        };

        // Commands issued while we were waiting for this chunk take effect
        // before it is decoded.
        if !drain_commands(&commands, &decoder, relay.as_ref(), &mut paused) {
            return;
        }
        if paused {
            continue;
        }

        let outcome = lock_decoder(&decoder).accept_waveform(&chunk);
        // Lock released before relaying: the relay only forwards, but must
        // never hold up reset_recognizer either.
        match outcome {
            Decoded::Pending => {}
            Decoded::Partial(text) => relay.on_partial(&text),
            Decoded::Final(text) => relay.on_result(&text),
            Decoded::Failed => {
                relay.on_error("RECOGNITION_ERROR", "decoder rejected audio chunk")
            }
        }
    }
}

/// Apply all queued commands. Returns false when the loop must exit.
fn drain_commands(
    commands: &Receiver<LoopCommand>,
    decoder: &Mutex<Box<dyn Decoder>>,
    relay: &dyn RecognitionListener,
    paused: &mut bool,
) -> bool {
    loop {
        match commands.try_recv() {
            Ok(cmd) => {
                if !apply_command(cmd, decoder, relay, paused) {
                    return false;
                }
            }
            Err(TryRecvError::Empty) => return true,
            // Session handle dropped without an explicit shutdown.
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

fn apply_command(
    cmd: LoopCommand,
    decoder: &Mutex<Box<dyn Decoder>>,
    relay: &dyn RecognitionListener,
    paused: &mut bool,
) -> bool {
    match cmd {
        LoopCommand::Pause => {
            *paused = true;
            lock_decoder(decoder).reset();
            debug!("🔇 decoding paused");
        }
        LoopCommand::Resume => {
            *paused = false;
            lock_decoder(decoder).reset();
            debug!("🔊 decoding resumed");
        }
        LoopCommand::Cancel => {
            lock_decoder(decoder).reset();
            debug!("in-flight hypothesis discarded");
        }
        LoopCommand::Stop => {
            let text = lock_decoder(decoder).finalize();
            if let Some(text) = text {
                relay.on_final(&text);
            }
        }
        LoopCommand::Shutdown => return false,
    }
    true
}
