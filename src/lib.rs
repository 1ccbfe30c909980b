//! Babel Gateway - Live speech translation sessions
//!
//! This library provides the core functionality for the Babel gateway:
//! - Continuous speech capture with interim and final transcript segments
//! - Per-segment machine translation between any two catalog languages
//! - Voice output of translations (premium remote, native, or disabled)
//! - Persisted audio device and voice settings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Speech Capture                      │
//! │   continuous recognition → interim / final events   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Session Orchestrator                    │
//! │   transcripts  │  language pair  │  fan-out tasks   │
//! └──────┬─────────────────────────────────┬────────────┘
//!        │                                 │
//! ┌──────▼──────────────┐   ┌──────────────▼────────────┐
//! │  Translation Client  │   │       Voice Output        │
//! │  per-segment, lossy  │   │  premium │ native │ off   │
//! └──────────────────────┘   └───────────────────────────┘
//! ```

pub mod devices;
pub mod error;
pub mod languages;
pub mod playback;
pub mod recognition;
pub mod session;
pub mod settings;
pub mod synth;
pub mod translate;
pub mod voice;

pub use devices::{AudioDevice, DeviceKind, DeviceRegistry, MicrophoneAccess};
pub use error::{Error, Result};
pub use languages::{CATALOG, Language};
pub use playback::AudioPlayback;
pub use recognition::{
    RecognitionConfig, RecognitionEvent, SpeechRecognizer, UnsupportedRecognizer,
};
pub use session::{LanguagePair, Orchestrator, SessionState};
pub use settings::{Settings, SettingsPatch, SettingsStore, VoiceMethod};
pub use synth::{NativeSynthesizer, NullSynthesizer, SpeechParams, SynthVoice, VoiceQuality};
pub use translate::{MyMemoryClient, Translator};
pub use voice::{DisabledVoice, NativeVoice, PremiumVoice, VoiceOutput, VoiceSelector};
