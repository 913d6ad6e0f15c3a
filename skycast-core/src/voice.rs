//! Single-utterance voice input.
//!
//! A [`VoiceInput`] session moves `Idle → Listening → Idle`. Starting checks
//! the recognizer's support first, so an unsupported environment is reported
//! as [`VoiceError::Unsupported`] rather than as a failed recognition.
//! [`VoiceInput::stop`] may be called from another task while a session is
//! listening; the pending [`VoiceInput::start`] then resolves to `Ok(None)`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{fmt::Debug, process::Stdio};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{error::VoiceError, i18n::Locale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: Locale,
}

impl RecognitionOptions {
    /// One final result for one utterance.
    pub fn single_utterance(language: Locale) -> Self {
        Self {
            continuous: false,
            interim_results: false,
            language,
        }
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync + Debug {
    fn is_supported(&self) -> bool;

    async fn recognize(&self, options: &RecognitionOptions) -> Result<String, VoiceError>;
}

#[derive(Debug)]
pub struct VoiceInput {
    recognizer: Box<dyn SpeechRecognizer>,
    state: Mutex<VoiceState>,
    cancel: Mutex<CancellationToken>,
}

impl VoiceInput {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            state: Mutex::new(VoiceState::Idle),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    pub fn state(&self) -> VoiceState {
        *self.state.lock()
    }

    /// Listen for one utterance. `Ok(None)` means the session was stopped.
    pub async fn start(&self, language: Locale) -> Result<Option<String>, VoiceError> {
        if !self.recognizer.is_supported() {
            return Err(VoiceError::Unsupported);
        }

        let cancel = {
            let mut state = self.state.lock();
            if *state == VoiceState::Listening {
                return Err(VoiceError::AlreadyListening);
            }
            *state = VoiceState::Listening;

            let token = CancellationToken::new();
            *self.cancel.lock() = token.clone();
            token
        };

        let _idle_on_exit = IdleOnDrop(&self.state);

        let options = RecognitionOptions::single_utterance(language);
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("voice session stopped");
                return Ok(None);
            }
            res = self.recognizer.recognize(&options) => res,
        };

        let transcript = outcome?;
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(VoiceError::Recognition("no speech recognized".to_string()));
        }
        Ok(Some(transcript.to_string()))
    }

    /// Return to `Idle` at once, discarding any pending result.
    pub fn stop(&self) {
        self.cancel.lock().cancel();
        *self.state.lock() = VoiceState::Idle;
    }
}

/// Puts the session back to `Idle` however `start` exits, including when its
/// future is dropped mid-listen.
struct IdleOnDrop<'a>(&'a Mutex<VoiceState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock() = VoiceState::Idle;
    }
}

/// Runs an external dictation program and takes the first non-empty stdout
/// line as the transcript. Without a command the capability is unsupported.
#[derive(Debug, Clone, Default)]
pub struct CommandRecognizer {
    argv: Vec<String>,
}

/// Language hint passed to the dictation program.
pub const VOICE_LANG_ENV: &str = "SKYCAST_VOICE_LANG";

impl CommandRecognizer {
    pub fn new(command: Option<&str>) -> Self {
        let argv = command
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Self { argv }
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    fn is_supported(&self) -> bool {
        !self.argv.is_empty()
    }

    async fn recognize(&self, options: &RecognitionOptions) -> Result<String, VoiceError> {
        let (program, args) = self.argv.split_first().ok_or(VoiceError::Unsupported)?;
        debug!(%program, ?args, "starting dictation command");

        let output = Command::new(program)
            .args(args)
            .env(VOICE_LANG_ENV, options.language.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| VoiceError::Recognition(format!("failed to run {program}: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Recognition(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string())
    }
}
