//! Engine capability traits
//!
//! The recognition engine (model loading, decoding, audio frontend) is an
//! external collaborator. These traits describe exactly what the session
//! core needs from it; `engine::vosk` provides a Vosk-backed implementation
//! behind the `vosk` feature.

#[cfg(feature = "vosk")]
pub mod vosk;

#[cfg(feature = "vosk")]
pub use self::vosk::VoskEngine;

use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::error::BridgeResult;

/// Outcome of feeding one audio chunk to a decoder.
///
/// Engine implementations map empty hypotheses to `Pending`; the decode
/// loop forwards `Partial`/`Final` text verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Chunk accepted, nothing new to report.
    Pending,
    /// Utterance in progress; the current partial hypothesis.
    Partial(String),
    /// Utterance finalized; the full hypothesis text.
    Final(String),
    /// The decoder rejected the chunk.
    Failed,
}

/// Stateful decoder bound to one model and one sample rate
pub trait Decoder: Send {
    /// Feed 16-bit mono PCM samples.
    fn accept_waveform(&mut self, samples: &[i16]) -> Decoded;

    /// Force-finalize the current utterance and return its text, if any.
    fn finalize(&mut self) -> Option<String>;

    /// Drop the in-flight hypothesis without producing a result.
    fn reset(&mut self);
}

/// Result of waiting for the next audio chunk.
pub enum ChunkRead {
    Chunk(Vec<i16>),
    TimedOut,
    Closed,
}

/// Pull-based audio frontend feeding the decode loop.
///
/// Capture itself is out of scope; the embedder supplies a source (commonly
/// a [`ChannelSource`] fed from its capture callback).
pub trait AudioSource: Send {
    /// Wait up to `timeout` for the next chunk of 16-bit mono PCM.
    fn read_chunk(&mut self, timeout: Duration) -> ChunkRead;
}

/// Adapter exposing an `mpsc` receiver as an [`AudioSource`].
pub struct ChannelSource {
    rx: Receiver<Vec<i16>>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Vec<i16>>) -> Self {
        Self { rx }
    }
}

impl AudioSource for ChannelSource {
    fn read_chunk(&mut self, timeout: Duration) -> ChunkRead {
        match self.rx.recv_timeout(timeout) {
            Ok(chunk) => ChunkRead::Chunk(chunk),
            Err(RecvTimeoutError::Timeout) => ChunkRead::TimedOut,
            Err(RecvTimeoutError::Disconnected) => ChunkRead::Closed,
        }
    }
}

/// Callbacks emitted from the decode-loop thread.
///
/// Implementations must only forward; blocking work here stalls decoding.
pub trait RecognitionListener: Send {
    fn on_partial(&self, text: &str);
    fn on_result(&self, text: &str);
    /// End-of-stream result (source closed or explicit stop).
    fn on_final(&self, text: &str);
    fn on_error(&self, code: &str, message: &str);
    /// Reporting-only; no session behavior is mapped to it.
    fn on_timeout(&self) {}
}

/// Factory surface of a recognition engine
pub trait SpeechEngine: Send {
    /// Opaque loaded-model handle, shared between the manager and any
    /// decoders created from it.
    type Model: Send + Sync;

    /// Load a model from a filesystem path.
    fn load_model(&self, path: &Path) -> BridgeResult<Self::Model>;

    /// Create a decoder for `model` at `sample_rate`, optionally restricted
    /// to a grammar of allowed phrases.
    fn create_decoder(
        &self,
        model: &Self::Model,
        sample_rate: f32,
        grammar: Option<&[String]>,
    ) -> BridgeResult<Box<dyn Decoder>>;

    /// Open the audio frontend for a new listening session.
    fn open_audio(&mut self, sample_rate: f32) -> BridgeResult<Box<dyn AudioSource>>;

    /// Whether a grammar passed to `create_decoder` actually restricts
    /// recognition. When false, grammars are accepted but ignored.
    fn supports_grammar(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_source_reads_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut source = ChannelSource::new(rx);
        tx.send(vec![1i16, 2, 3]).unwrap();
        tx.send(vec![4i16]).unwrap();

        match source.read_chunk(Duration::from_millis(100)) {
            ChunkRead::Chunk(c) => assert_eq!(c, vec![1, 2, 3]),
            _ => panic!("expected first chunk"),
        }
        match source.read_chunk(Duration::from_millis(100)) {
            ChunkRead::Chunk(c) => assert_eq!(c, vec![4]),
            _ => panic!("expected second chunk"),
        }
    }

    #[test]
    fn test_channel_source_timeout_and_close() {
        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        let mut source = ChannelSource::new(rx);

        assert!(matches!(
            source.read_chunk(Duration::from_millis(10)),
            ChunkRead::TimedOut
        ));

        drop(tx);
        assert!(matches!(
            source.read_chunk(Duration::from_millis(10)),
            ChunkRead::Closed
        ));
    }
}
