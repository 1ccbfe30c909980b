//! Speech recognition interface
//!
//! The gateway does not implement recognition itself; it consumes whatever
//! engine the host provides through [`SpeechRecognizer`]. The engine delivers
//! interim and final transcript segments over a channel until stopped or until
//! a terminal error.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// Parameters for a recognition stream
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// BCP-47 tag of the spoken language
    pub language: String,

    /// Keep recognizing across utterance boundaries
    pub continuous: bool,

    /// Deliver provisional (not-yet-final) segments
    pub interim_results: bool,
}

impl RecognitionConfig {
    /// Continuous interim-enabled capture in `language`, the mode a live
    /// translation session uses
    #[must_use]
    pub fn live(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            continuous: true,
            interim_results: true,
        }
    }
}

/// One event from the recognition engine
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// A transcript segment; interim segments are superseded by later events
    /// with the same index, final ones are committed
    Result {
        /// Position of this result within the stream
        index: usize,
        /// Whether the segment is committed
        is_final: bool,
        /// Best-guess transcript text
        text: String,
    },

    /// Terminal engine failure; no further events follow
    Error(String),

    /// The engine ended the stream on its own
    End,
}

/// A host speech-recognition capability
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the capability is present in this environment
    fn is_supported(&self) -> bool;

    /// Begin recognizing; events arrive on the returned channel until
    /// [`SpeechRecognizer::stop`] is called or the engine fails
    ///
    /// # Errors
    ///
    /// Returns error if the capability is absent or the stream cannot start
    async fn start(&self, config: RecognitionConfig) -> Result<mpsc::Receiver<RecognitionEvent>>;

    /// Halt the active stream; safe to call when idle
    async fn stop(&self);
}

/// Recognizer for environments without a speech engine
///
/// Always reports unsupported; [`SpeechRecognizer::start`] fails so callers
/// fall back to text mode.
pub struct UnsupportedRecognizer;

#[async_trait]
impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn start(&self, _config: RecognitionConfig) -> Result<mpsc::Receiver<RecognitionEvent>> {
        Err(crate::Error::Unsupported(
            "no speech recognition engine available".to_string(),
        ))
    }

    async fn stop(&self) {}
}
