//! Vosk-backed engine implementation
//!
//! Wraps the `vosk` crate behind the [`SpeechEngine`] capability traits.
//! Audio capture stays with the embedder: `VoskEngine` is constructed with
//! a source factory (commonly handing out a
//! [`ChannelSource`](crate::engine::ChannelSource) fed from a capture
//! callback or a raw PCM pipe).

use std::path::Path;

use tracing::{debug, info};
use vosk::{DecodingState, Model, Recognizer};

use crate::engine::{AudioSource, Decoded, Decoder, SpeechEngine};
use crate::error::{BridgeError, BridgeResult};

/// Factory handing out one audio source per listening session.
pub type SourceFactory = Box<dyn FnMut(f32) -> BridgeResult<Box<dyn AudioSource>> + Send>;

/// Vosk-based recognition engine
pub struct VoskEngine {
    audio: SourceFactory,
}

impl VoskEngine {
    pub fn new(audio: SourceFactory) -> Self {
        Self { audio }
    }
}

impl SpeechEngine for VoskEngine {
    type Model = Model;

    fn load_model(&self, path: &Path) -> BridgeResult<Model> {
        let path_str = path.to_str().ok_or_else(|| {
            BridgeError::Model(format!("model path is not valid UTF-8: {}", path.display()))
        })?;

        info!("loading Vosk model from {path_str}");
        Model::new(path_str)
            .ok_or_else(|| BridgeError::Model(format!("failed to load Vosk model at {path_str}")))
    }

    fn create_decoder(
        &self,
        model: &Model,
        sample_rate: f32,
        grammar: Option<&[String]>,
    ) -> BridgeResult<Box<dyn Decoder>> {
        let recognizer = match grammar {
            Some(phrases) if !phrases.is_empty() => {
                info!("⚙️ using grammar ({} phrases)", phrases.len());
                Recognizer::new_with_grammar(model, sample_rate, phrases)
            }
            _ => Recognizer::new(model, sample_rate),
        }
        .ok_or_else(|| BridgeError::Recognizer("failed to create Vosk recognizer".into()))?;

        Ok(Box::new(VoskDecoder { recognizer }))
    }

    fn open_audio(&mut self, sample_rate: f32) -> BridgeResult<Box<dyn AudioSource>> {
        (self.audio)(sample_rate)
    }

    fn supports_grammar(&self) -> bool {
        true
    }
}

struct VoskDecoder {
    recognizer: Recognizer,
}

impl Decoder for VoskDecoder {
    fn accept_waveform(&mut self, samples: &[i16]) -> Decoded {
        match self.recognizer.accept_waveform(samples) {
            DecodingState::Finalized => {
                let text = self
                    .recognizer
                    .final_result()
                    .single()
                    .and_then(|r| extract_text(r.text));
                match text {
                    Some(text) => Decoded::Final(text),
                    None => Decoded::Pending,
                }
            }
            DecodingState::Running => {
                match extract_text(self.recognizer.partial_result().partial) {
                    Some(text) => Decoded::Partial(text),
                    None => Decoded::Pending,
                }
            }
            DecodingState::Failed => {
                debug!("decoding failed for this chunk");
                Decoded::Failed
            }
        }
    }

    fn finalize(&mut self) -> Option<String> {
        let text = self
            .recognizer
            .final_result()
            .single()
            .and_then(|r| extract_text(r.text));
        self.recognizer.reset();
        text
    }

    fn reset(&mut self) {
        self.recognizer.reset();
    }
}

/// Extract text from a Vosk result, filtering empty hypotheses
fn extract_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        assert_eq!(extract_text(""), None);
        assert_eq!(extract_text("  "), None);
        assert_eq!(extract_text("hello"), Some("hello".to_string()));
        assert_eq!(extract_text("  hello  "), Some("hello".to_string()));
    }
}
