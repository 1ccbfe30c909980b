//! Native speech synthesis interface
//!
//! Consumed capability: the host's built-in synthesizer, exposed as a voice
//! list plus speak/cancel. Voice selection for a target language lives here
//! so every [`NativeSynthesizer`] implementation gets the same fallback
//! behavior.

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;

/// Relative quality of a synthesizer voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceQuality {
    /// Basic engine
    Standard,
    /// Enhanced / premium-grade engine
    High,
}

/// A voice offered by the host synthesizer
#[derive(Debug, Clone, Serialize)]
pub struct SynthVoice {
    /// Stable voice identifier
    pub id: String,

    /// BCP-47 tag the voice speaks
    pub lang: String,

    /// Engine quality, used to break ties between matches
    pub quality: VoiceQuality,
}

/// Prosody parameters applied to an utterance
#[derive(Debug, Clone, Copy)]
pub struct SpeechParams {
    /// Speech rate multiplier
    pub rate: f32,
    /// Voice pitch
    pub pitch: f32,
    /// Playback volume
    pub volume: f32,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// A host speech-synthesis capability
#[async_trait]
pub trait NativeSynthesizer: Send + Sync {
    /// Whether the capability is present in this environment
    fn is_supported(&self) -> bool;

    /// Voices currently installed
    fn voices(&self) -> Vec<SynthVoice>;

    /// Speak `text` with the given voice; supersedes any in-progress
    /// utterance from this synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn speak(&self, text: &str, voice: &SynthVoice, params: SpeechParams) -> Result<()>;

    /// Cancel the in-progress utterance; safe to call when idle
    fn cancel(&self);

    /// Whether an utterance is in progress
    fn is_speaking(&self) -> bool;
}

/// Pick the best voice for a target language
///
/// Fallback chain: the user's preferred voice id, an exact language match, a
/// language-family match (same primary subtag), then any available voice.
/// Within each tier, higher-quality voices win.
#[must_use]
pub fn select_voice<'v>(
    voices: &'v [SynthVoice],
    lang: &str,
    preferred_id: Option<&str>,
) -> Option<&'v SynthVoice> {
    if let Some(id) = preferred_id {
        if let Some(voice) = voices.iter().find(|v| v.id == id) {
            return Some(voice);
        }
    }

    let family = lang.split('-').next().unwrap_or_default();

    best_of(voices, |v| v.lang.eq_ignore_ascii_case(lang))
        .or_else(|| {
            best_of(voices, |v| {
                v.lang
                    .split('-')
                    .next()
                    .is_some_and(|f| f.eq_ignore_ascii_case(family))
            })
        })
        .or_else(|| best_of(voices, |_| true))
}

fn best_of<'v>(
    voices: &'v [SynthVoice],
    matches: impl Fn(&SynthVoice) -> bool,
) -> Option<&'v SynthVoice> {
    voices
        .iter()
        .filter(|v| matches(v))
        .max_by_key(|v| v.quality)
}

/// Synthesizer for environments without a speech engine
pub struct NullSynthesizer;

#[async_trait]
impl NativeSynthesizer for NullSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<SynthVoice> {
        Vec::new()
    }

    async fn speak(&self, _text: &str, _voice: &SynthVoice, _params: SpeechParams) -> Result<()> {
        Err(crate::Error::Unsupported(
            "no native speech synthesizer available".to_string(),
        ))
    }

    fn cancel(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}
