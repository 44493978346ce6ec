//! SpeechBridge
//!
//! Session lifecycle and event delivery for a continuous-recognition speech
//! engine. The engine (model loading, decoding, audio frontend) plugs in
//! behind the [`engine::SpeechEngine`] traits; [`manager::SessionManager`]
//! sequences model/recognizer/session creation, and [`event::EventBus`]
//! carries results, partials, and errors from the decode-loop thread to
//! whichever consumer is currently attached.

pub mod commands;
pub mod engine;
pub mod error;
pub mod event;
pub mod manager;
pub mod session;

pub use commands::{Command, Reply};
pub use error::{BridgeError, BridgeResult};
pub use event::{ErrorEvent, EventBus};
pub use manager::{SessionManager, RECOGNIZER_ID};
pub use session::{ListeningSession, PAUSE_DISCARDS_HYPOTHESIS};

#[cfg(feature = "vosk")]
pub use engine::VoskEngine;
