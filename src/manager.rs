//! Session manager: resource slots and the legal state machine
//!
//! Holds at most one model, one recognizer handle, and one listening
//! session, and sequences every transition between them:
//!
//! `NoModel → HasModel → HasRecognizer → {Listening ⇄ Paused} → (destroy) → HasRecognizer`
//!
//! Replacement contract: `create_model` and `create_recognizer` replace the
//! previous slot without tearing down dependents. A recognizer created
//! against an earlier model keeps that model alive through its own
//! references, so replacement is safe but callers that want the new model
//! in effect must re-create the recognizer (and session) themselves.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::engine::{Decoder, SpeechEngine};
use crate::error::{BridgeError, BridgeResult};
use crate::event::{EventBus, EventRelay};
use crate::session::{lock_decoder, ListeningSession};

/// Identifier returned by `create_recognizer`. A single recognizer slot is
/// supported, so the id is always 0.
pub const RECOGNIZER_ID: u32 = 0;

/// A decoder bound to one model and one sample-rate/grammar configuration.
///
/// The decoder is shared with the decode loop so it can be reset while a
/// session is live, and so a destroyed session can be re-initialized
/// without re-creating the recognizer.
pub struct RecognizerHandle {
    decoder: Arc<Mutex<Box<dyn Decoder>>>,
    sample_rate: f32,
}

impl RecognizerHandle {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Top-level coordinator over model, recognizer, and listening session.
pub struct SessionManager<E: SpeechEngine> {
    engine: E,
    bus: Arc<EventBus>,
    model: Option<Arc<E::Model>>,
    recognizer: Option<RecognizerHandle>,
    session: Option<ListeningSession>,
}

impl<E: SpeechEngine> SessionManager<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            bus: Arc::new(EventBus::new()),
            model: None,
            recognizer: None,
            session: None,
        }
    }

    /// Consumer attach/detach surface for the three event streams.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Load a model from `path`, replacing any prior model.
    ///
    /// An existing recognizer or session keeps running against the old
    /// model; destroy and re-create them to pick up the new one.
    pub fn create_model(&mut self, path: &Path) -> BridgeResult<()> {
        if !path.exists() {
            return Err(BridgeError::Model(format!(
                "model not found at {}",
                path.display()
            )));
        }

        info!("loading model from {}", path.display());
        let model = self.engine.load_model(path)?;
        self.model = Some(Arc::new(model));
        Ok(())
    }

    /// Create a recognizer at `sample_rate`, silently replacing any prior
    /// one. Requires a loaded model.
    ///
    /// Grammar is best-effort: when the engine does not support it, the
    /// grammar is accepted but has no effect.
    pub fn create_recognizer(
        &mut self,
        sample_rate: f32,
        grammar: Option<Vec<String>>,
    ) -> BridgeResult<u32> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| BridgeError::Recognizer("no model loaded".into()))?;

        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(BridgeError::Recognizer(format!(
                "sample rate must be a positive number, got {sample_rate}"
            )));
        }

        if grammar.is_some() && !self.engine.supports_grammar() {
            warn!("engine does not support grammars; grammar ignored");
        }

        let decoder = self
            .engine
            .create_decoder(model, sample_rate, grammar.as_deref())?;

        self.recognizer = Some(RecognizerHandle {
            decoder: Arc::new(Mutex::new(decoder)),
            sample_rate,
        });
        info!("recognizer created at {} Hz", sample_rate);
        Ok(RECOGNIZER_ID)
    }

    /// Start a listening session at the recognizer's sample rate. Any
    /// previous session is fully shut down first.
    pub fn init_session(&mut self) -> BridgeResult<bool> {
        // Only one session may be live at a time; shut the old one down
        // fully before starting the next.
        if let Some(mut previous) = self.session.take() {
            previous.shutdown();
        }

        let handle = self
            .recognizer
            .as_ref()
            .ok_or_else(|| BridgeError::Service("no recognizer created".into()))?;

        let source = self.engine.open_audio(handle.sample_rate)?;
        let relay = Box::new(EventRelay::new(Arc::clone(&self.bus)));
        let session = ListeningSession::start(Arc::clone(&handle.decoder), source, relay)?;
        self.session = Some(session);
        Ok(true)
    }

    /// Suspend (`true`) or resume (`false`) decoding. No-op success when no
    /// session exists.
    pub fn set_pause(&self, paused: bool) {
        if let Some(session) = &self.session {
            if paused {
                session.pause();
            } else {
                session.resume();
            }
        }
    }

    /// Discard the in-flight hypothesis; the loop keeps running. No-op
    /// success when no session exists.
    pub fn cancel(&self) {
        if let Some(session) = &self.session {
            session.cancel();
        }
    }

    /// Finalize the current utterance and flush its result. No-op success
    /// when no session exists.
    pub fn stop(&self) {
        if let Some(session) = &self.session {
            session.stop();
        }
    }

    /// Clear the recognizer's decode state without touching the session.
    /// No-op success when no recognizer exists.
    pub fn reset_recognizer(&self) {
        if let Some(handle) = &self.recognizer {
            lock_decoder(&handle.decoder).reset();
        }
    }

    /// Shut down and release the listening session. Never fails; safe from
    /// any state, including never-initialized.
    pub fn destroy_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
    }

    /// Full teardown: event registrations, session, recognizer, model.
    /// Safe from any state.
    pub fn detach(&mut self) {
        self.bus.detach_result();
        self.bus.detach_partial();
        self.bus.detach_error();
        self.destroy_session();
        self.recognizer = None;
        self.model = None;
    }
}
