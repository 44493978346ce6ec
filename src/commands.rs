//! Command surface
//!
//! A closed command enumeration with a single exhaustive dispatch, in place
//! of string-keyed method dispatch. Variant and field names mirror the wire
//! shapes an embedder would marshal (`model.create`, `recognizer.create`,
//! `session.*`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::SpeechEngine;
use crate::error::BridgeResult;
use crate::manager::SessionManager;

/// Caller commands accepted by the session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Command {
    CreateModel {
        path: PathBuf,
    },
    CreateRecognizer {
        sample_rate: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grammar: Option<Vec<String>>,
    },
    InitSession,
    Stop,
    Reset,
    SetPause {
        paused: bool,
    },
    Cancel,
    DestroySession,
}

/// Successful command replies, mirroring the original surface
/// (none / fixed recognizer id / boolean acknowledgement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    None,
    RecognizerId(u32),
    Ack(bool),
}

impl<E: SpeechEngine> SessionManager<E> {
    /// Dispatch one command. Failures carry the taxonomy code via
    /// [`crate::BridgeError::code`]; no command ever panics the process.
    pub fn dispatch(&mut self, command: Command) -> BridgeResult<Reply> {
        match command {
            Command::CreateModel { path } => {
                self.create_model(&path)?;
                Ok(Reply::None)
            }
            Command::CreateRecognizer {
                sample_rate,
                grammar,
            } => {
                let id = self.create_recognizer(sample_rate, grammar)?;
                Ok(Reply::RecognizerId(id))
            }
            Command::InitSession => {
                let started = self.init_session()?;
                Ok(Reply::Ack(started))
            }
            Command::Stop => {
                self.stop();
                Ok(Reply::Ack(true))
            }
            Command::Reset => {
                self.reset_recognizer();
                Ok(Reply::Ack(true))
            }
            Command::SetPause { paused } => {
                self.set_pause(paused);
                Ok(Reply::Ack(true))
            }
            Command::Cancel => {
                self.cancel();
                Ok(Reply::Ack(true))
            }
            Command::DestroySession => {
                self.destroy_session();
                Ok(Reply::None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_shape() {
        let cmd: Command = serde_json::from_str(
            r#"{"cmd":"createRecognizer","sample_rate":16000.0,"grammar":["yes","no"]}"#,
        )
        .unwrap();
        match cmd {
            Command::CreateRecognizer {
                sample_rate,
                grammar,
            } => {
                assert_eq!(sample_rate, 16000.0);
                assert_eq!(grammar.unwrap(), vec!["yes", "no"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_grammar_is_optional_on_the_wire() {
        let cmd: Command =
            serde_json::from_str(r#"{"cmd":"createRecognizer","sample_rate":8000.0}"#).unwrap();
        assert!(matches!(
            cmd,
            Command::CreateRecognizer { grammar: None, .. }
        ));
    }
}
