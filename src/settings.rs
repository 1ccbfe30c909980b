//! Persisted user settings
//!
//! One process-wide store owns the settings record: audio device choices and
//! voice preferences. Every update merges group-wise (a patch to one field
//! never erases sibling fields) and is written back to disk immediately.
//! A missing or corrupt file falls back to defaults without failing.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::Result;

/// File name of the serialized settings record
const SETTINGS_FILE: &str = "settings.json";

/// File name of the persisted UI language preference
const UI_LANG_FILE: &str = "ui_lang";

/// Voice synthesis backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMethod {
    /// Remote premium synthesis (requires an API credential)
    Premium,
    /// Host speech synthesizer
    #[default]
    Native,
    /// No playback
    Disabled,
}

/// Audio device selection; `None` means the system default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Selected input device id
    pub input_id: Option<String>,

    /// Selected output device id
    pub output_id: Option<String>,
}

/// Voice output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    /// Preferred native voice id, if the user picked one
    pub voice_id: Option<String>,

    /// Speech rate multiplier
    pub rate: f32,

    /// Voice pitch
    pub pitch: f32,

    /// Playback volume
    pub volume: f32,

    /// Speak every translated segment as it arrives
    pub auto_speak: bool,

    /// Which synthesis backend to use
    pub method: VoiceMethod,

    /// Premium synthesis API credential
    pub api_key: Option<String>,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            voice_id: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            auto_speak: true,
            method: VoiceMethod::Native,
            api_key: None,
        }
    }
}

/// The full persisted settings record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Audio device selection
    pub audio: AudioSettings,

    /// Voice output preferences
    pub tts: TtsSettings,
}

/// Partial update for the audio group
///
/// Outer `Option` means "leave unchanged"; the inner value replaces the field,
/// so `Some(None)` clears a device selection back to the system default.
#[derive(Debug, Clone, Default)]
pub struct AudioPatch {
    pub input_id: Option<Option<String>>,
    pub output_id: Option<Option<String>>,
}

/// Partial update for the voice group
#[derive(Debug, Clone, Default)]
pub struct TtsPatch {
    pub voice_id: Option<Option<String>>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub auto_speak: Option<bool>,
    pub method: Option<VoiceMethod>,
    pub api_key: Option<Option<String>>,
}

/// Partial update for the whole record; absent groups are untouched
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub audio: Option<AudioPatch>,
    pub tts: Option<TtsPatch>,
}

/// Owns the settings record and its backing file
///
/// Callers receive a handle (typically `Arc<SettingsStore>`); all mutation
/// goes through [`SettingsStore::update`].
pub struct SettingsStore {
    dir: PathBuf,
    state: Mutex<Settings>,
}

impl SettingsStore {
    /// Open the store backed by files in `dir`, loading any persisted record
    ///
    /// A missing or unparseable file yields defaults.
    #[must_use]
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let state = load_settings(&dir.join(SETTINGS_FILE));
        Self {
            dir,
            state: Mutex::new(state),
        }
    }

    /// Open the store in the default per-user config directory
    ///
    /// # Errors
    ///
    /// Returns error if no home directory can be determined
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(default_config_dir()?))
    }

    /// Current settings snapshot
    #[must_use]
    pub fn get(&self) -> Settings {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Apply a partial update and persist the result
    ///
    /// Groups merge field-wise; numeric voice parameters are clamped to their
    /// valid ranges. Persistence failures are logged, never raised.
    pub fn update(&self, patch: SettingsPatch) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        if let Some(audio) = patch.audio {
            if let Some(input_id) = audio.input_id {
                state.audio.input_id = input_id;
            }
            if let Some(output_id) = audio.output_id {
                state.audio.output_id = output_id;
            }
        }

        if let Some(tts) = patch.tts {
            if let Some(voice_id) = tts.voice_id {
                state.tts.voice_id = voice_id;
            }
            if let Some(rate) = tts.rate {
                state.tts.rate = rate.clamp(0.25, 4.0);
            }
            if let Some(pitch) = tts.pitch {
                state.tts.pitch = pitch.clamp(0.0, 2.0);
            }
            if let Some(volume) = tts.volume {
                state.tts.volume = volume.clamp(0.0, 1.0);
            }
            if let Some(auto_speak) = tts.auto_speak {
                state.tts.auto_speak = auto_speak;
            }
            if let Some(method) = tts.method {
                state.tts.method = method;
            }
            if let Some(api_key) = tts.api_key {
                state.tts.api_key = api_key;
            }
        }

        // Write while still holding the lock; racing updates must not let an
        // older snapshot reach the file last
        self.persist(&state);
    }

    /// Persisted UI language preference, defaulting to French
    #[must_use]
    pub fn ui_language(&self) -> String {
        std::fs::read_to_string(self.dir.join(UI_LANG_FILE))
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "fr".to_string())
    }

    /// Persist the UI language preference
    pub fn set_ui_language(&self, lang: &str) {
        if let Err(e) = ensure_dir(&self.dir)
            .and_then(|()| std::fs::write(self.dir.join(UI_LANG_FILE), lang).map_err(Into::into))
        {
            tracing::warn!(error = %e, "failed to persist UI language");
        }
    }

    fn persist(&self, settings: &Settings) {
        let path = self.dir.join(SETTINGS_FILE);
        let result = ensure_dir(&self.dir).and_then(|()| {
            let json = serde_json::to_string_pretty(settings)?;
            std::fs::write(&path, json)?;
            Ok(())
        });

        match result {
            Ok(()) => tracing::debug!(path = %path.display(), "settings persisted"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to persist settings"),
        }
    }
}

/// Default per-user config directory for the gateway
///
/// # Errors
///
/// Returns error if no home directory can be determined
pub fn default_config_dir() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.config_dir().join("babel"))
        .ok_or_else(|| crate::Error::Config("no home directory found".to_string()))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "corrupt settings file, using defaults"
                );
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}
