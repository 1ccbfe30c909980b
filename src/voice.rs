//! Voice output backends
//!
//! Three interchangeable implementations of [`VoiceOutput`]: remote premium
//! synthesis, the host's native synthesizer, and a disabled no-op. The
//! [`VoiceSelector`] picks one from the settings store on every utterance, so
//! a settings change takes effect on the next one.

use std::sync::Arc;

use async_trait::async_trait;

use crate::playback::AudioPlayback;
use crate::settings::{SettingsStore, VoiceMethod};
use crate::synth::{self, NativeSynthesizer, SpeechParams};
use crate::{Error, Result};

/// Premium synthesis endpoint
const PREMIUM_BASE_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Default premium voice ("Aria")
const PREMIUM_VOICE_ID: &str = "9BWtsMINqrJLrRacOk9x";

/// Premium model able to speak every catalog language
const PREMIUM_MODEL_ID: &str = "eleven_multilingual_v2";

/// Speaks translated text in a target language
#[async_trait]
pub trait VoiceOutput: Send + Sync {
    /// Speak `text` in `lang`, superseding any in-progress playback from
    /// this backend
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str, lang: &str) -> Result<()>;

    /// Cancel the in-progress playback; safe to call when idle
    fn stop(&self);

    /// Whether this backend can produce audio right now
    fn is_supported(&self) -> bool;

    /// Whether playback is in progress
    fn is_speaking(&self) -> bool;
}

/// Remote premium synthesis; converts text to MP3 and plays it locally
pub struct PremiumVoice {
    client: reqwest::Client,
    api_key: Option<String>,
    playback: Arc<AudioPlayback>,
    base_url: String,
}

impl PremiumVoice {
    /// Create a premium backend with the given credential
    #[must_use]
    pub fn new(api_key: Option<String>, playback: Arc<AudioPlayback>) -> Self {
        Self::with_base_url(api_key, playback, PREMIUM_BASE_URL)
    }

    /// Create a premium backend against a custom endpoint
    #[must_use]
    pub fn with_base_url(
        api_key: Option<String>,
        playback: Arc<AudioPlayback>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            playback,
            base_url: base_url.into(),
        }
    }

    async fn synthesize(&self, text: &str, api_key: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct VoiceSettings {
            stability: f32,
            similarity_boost: f32,
        }

        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            voice_settings: VoiceSettings,
        }

        let request = SpeechRequest {
            text,
            model_id: PREMIUM_MODEL_ID,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };

        let url = format!("{}/{PREMIUM_VOICE_ID}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "premium synthesis error {status}: {body}"
            )));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl VoiceOutput for PremiumVoice {
    async fn speak(&self, text: &str, lang: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err(Error::Unsupported(
                "premium synthesis requires an API key".to_string(),
            ));
        };

        // One playback at a time; a new utterance supersedes the current one
        self.playback.cancel();

        tracing::debug!(lang, chars = text.len(), "premium synthesis");
        let audio = self.synthesize(text, api_key).await?;
        self.playback.play_mp3(&audio).await
    }

    fn stop(&self) {
        self.playback.cancel();
    }

    fn is_supported(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn is_speaking(&self) -> bool {
        self.playback.is_playing()
    }
}

/// Host synthesizer wrapper applying voice selection and prosody settings
pub struct NativeVoice {
    synth: Arc<dyn NativeSynthesizer>,
    preferred_voice: Option<String>,
    params: SpeechParams,
}

impl NativeVoice {
    /// Wrap a host synthesizer
    #[must_use]
    pub fn new(
        synth: Arc<dyn NativeSynthesizer>,
        preferred_voice: Option<String>,
        params: SpeechParams,
    ) -> Self {
        Self {
            synth,
            preferred_voice,
            params,
        }
    }
}

#[async_trait]
impl VoiceOutput for NativeVoice {
    async fn speak(&self, text: &str, lang: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let voices = self.synth.voices();
        let voice = synth::select_voice(&voices, lang, self.preferred_voice.as_deref())
            .ok_or_else(|| Error::Synthesis(format!("no voice available for {lang}")))?;

        // Supersede the current utterance
        self.synth.cancel();

        tracing::debug!(lang, voice = %voice.id, "native synthesis");
        self.synth.speak(text, voice, self.params).await
    }

    fn stop(&self) {
        self.synth.cancel();
    }

    fn is_supported(&self) -> bool {
        self.synth.is_supported()
    }

    fn is_speaking(&self) -> bool {
        self.synth.is_speaking()
    }
}

/// No-op backend for `disabled` mode
pub struct DisabledVoice;

#[async_trait]
impl VoiceOutput for DisabledVoice {
    async fn speak(&self, _text: &str, _lang: &str) -> Result<()> {
        Ok(())
    }

    fn stop(&self) {}

    fn is_supported(&self) -> bool {
        false
    }

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Builds the voice backend matching the current settings
///
/// Selection is re-evaluated on each [`VoiceSelector::current`] call rather
/// than cached, so changing the method applies to the next utterance.
pub struct VoiceSelector {
    settings: Arc<SettingsStore>,
    synth: Arc<dyn NativeSynthesizer>,
    playback: Arc<AudioPlayback>,
}

impl VoiceSelector {
    /// Create a selector over the given capabilities
    #[must_use]
    pub fn new(
        settings: Arc<SettingsStore>,
        synth: Arc<dyn NativeSynthesizer>,
        playback: Arc<AudioPlayback>,
    ) -> Self {
        Self {
            settings,
            synth,
            playback,
        }
    }

    /// The backend for the next utterance, per current settings
    #[must_use]
    pub fn current(&self) -> Arc<dyn VoiceOutput> {
        let settings = self.settings.get();
        self.playback
            .set_preferred_output(settings.audio.output_id.clone());

        match settings.tts.method {
            VoiceMethod::Premium => Arc::new(PremiumVoice::new(
                settings.tts.api_key,
                Arc::clone(&self.playback),
            )),
            VoiceMethod::Native => Arc::new(NativeVoice::new(
                Arc::clone(&self.synth),
                settings.tts.voice_id,
                SpeechParams {
                    rate: settings.tts.rate,
                    pitch: settings.tts.pitch,
                    volume: settings.tts.volume,
                },
            )),
            VoiceMethod::Disabled => Arc::new(DisabledVoice),
        }
    }

    /// Cancel playback across every backend; safe to call when idle
    pub fn stop_all(&self) {
        self.playback.cancel();
        self.synth.cancel();
    }

    /// Whether any backend is currently speaking
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.playback.is_playing() || self.synth.is_speaking()
    }
}
