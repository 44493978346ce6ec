//! Scripted mock engine for session tests.
//!
//! Audio chunks double as a decode script: the first sample is a tag and
//! the remaining samples are the UTF-8 bytes of the hypothesis text, so a
//! test can drive the real decode loop to any partial/final/error sequence.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

use speechbridge::engine::{AudioSource, ChannelSource, Decoded, Decoder, SpeechEngine};
use speechbridge::error::{BridgeError, BridgeResult};

pub const TAG_PARTIAL: i16 = 1;
pub const TAG_FINAL: i16 = 2;
pub const TAG_FAILED: i16 = 3;

pub fn partial_chunk(text: &str) -> Vec<i16> {
    chunk(TAG_PARTIAL, text)
}

pub fn final_chunk(text: &str) -> Vec<i16> {
    chunk(TAG_FINAL, text)
}

pub fn failed_chunk() -> Vec<i16> {
    vec![TAG_FAILED]
}

fn chunk(tag: i16, text: &str) -> Vec<i16> {
    std::iter::once(tag)
        .chain(text.bytes().map(i16::from))
        .collect()
}

/// Engine whose decoders replay the chunk script above.
pub struct MockEngine {
    taps: Sender<Sender<Vec<i16>>>,
}

impl MockEngine {
    /// Returns the engine plus a channel yielding one audio feeder per
    /// session the manager opens.
    pub fn new() -> (Self, Receiver<Sender<Vec<i16>>>) {
        let (taps, taps_rx) = mpsc::channel();
        (Self { taps }, taps_rx)
    }
}

pub struct MockModel;

impl SpeechEngine for MockEngine {
    type Model = MockModel;

    fn load_model(&self, _path: &Path) -> BridgeResult<MockModel> {
        Ok(MockModel)
    }

    fn create_decoder(
        &self,
        _model: &MockModel,
        _sample_rate: f32,
        _grammar: Option<&[String]>,
    ) -> BridgeResult<Box<dyn Decoder>> {
        Ok(Box::new(ScriptedDecoder { pending: None }))
    }

    fn open_audio(&mut self, _sample_rate: f32) -> BridgeResult<Box<dyn AudioSource>> {
        let (tx, rx) = mpsc::channel();
        self.taps
            .send(tx)
            .map_err(|_| BridgeError::Service("test harness dropped its tap channel".into()))?;
        Ok(Box::new(ChannelSource::new(rx)))
    }
}

struct ScriptedDecoder {
    pending: Option<String>,
}

impl Decoder for ScriptedDecoder {
    fn accept_waveform(&mut self, samples: &[i16]) -> Decoded {
        let Some((&tag, body)) = samples.split_first() else {
            return Decoded::Pending;
        };
        let text =
            String::from_utf8(body.iter().map(|&s| s as u8).collect()).unwrap_or_default();
        match tag {
            TAG_PARTIAL => {
                self.pending = Some(text.clone());
                Decoded::Partial(text)
            }
            TAG_FINAL => {
                self.pending = None;
                Decoded::Final(text)
            }
            TAG_FAILED => Decoded::Failed,
            _ => Decoded::Pending,
        }
    }

    fn finalize(&mut self) -> Option<String> {
        self.pending.take()
    }

    fn reset(&mut self) {
        self.pending = None;
    }
}
