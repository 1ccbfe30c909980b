//! Shared fakes for session integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use babel_gateway::{
    Error, MicrophoneAccess, NativeSynthesizer, Orchestrator, RecognitionConfig, RecognitionEvent,
    Result, SettingsStore, SpeechParams, SpeechRecognizer, SynthVoice, Translator, VoiceQuality,
    VoiceSelector,
};
use babel_gateway::{AudioPlayback, NullSynthesizer, SettingsPatch, VoiceMethod};

/// One scripted recognition stream: (delay before delivery, event) pairs
pub type Script = Vec<(u64, RecognitionEvent)>;

/// Recognizer that replays scripted event streams, one per `start`
///
/// Each stream delivers its entries on schedule and then closes, as a real
/// engine's end notification does. Stopping halts only the stream opened by
/// the most recent `start`.
pub struct ScriptedRecognizer {
    scripts: Mutex<VecDeque<Script>>,
    started: Mutex<Vec<RecognitionConfig>>,
    current: Mutex<Option<Arc<AtomicBool>>>,
}

impl ScriptedRecognizer {
    pub fn new(script: Script) -> Self {
        Self::with_scripts(vec![script])
    }

    /// Scripts consumed in order by successive `start` calls
    pub fn with_scripts(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            started: Mutex::new(Vec::new()),
            current: Mutex::new(None),
        }
    }

    /// Configs passed to `start` so far
    pub fn starts(&self) -> Vec<RecognitionConfig> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn start(&self, config: RecognitionConfig) -> Result<mpsc::Receiver<RecognitionEvent>> {
        self.started.lock().unwrap().push(config);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        let stopped = Arc::new(AtomicBool::new(false));
        *self.current.lock().unwrap() = Some(Arc::clone(&stopped));

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for (delay_ms, event) in script {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }

    async fn stop(&self) {
        if let Some(stopped) = self.current.lock().unwrap().take() {
            stopped.store(true, Ordering::SeqCst);
        }
    }
}

/// Helper for building scripted transcript segments
pub fn interim(index: usize, text: &str) -> RecognitionEvent {
    RecognitionEvent::Result {
        index,
        is_final: false,
        text: text.to_string(),
    }
}

pub fn final_segment(index: usize, text: &str) -> RecognitionEvent {
    RecognitionEvent::Result {
        index,
        is_final: true,
        text: text.to_string(),
    }
}

/// Translator backed by a fixed phrase table, with optional per-phrase delay
///
/// Unknown phrases translate to empty, matching the degraded-service
/// behavior of the real client.
pub struct MappingTranslator {
    map: HashMap<String, (String, u64)>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MappingTranslator {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with(mut self, text: &str, translated: &str) -> Self {
        self.map
            .insert(text.to_string(), (translated.to_string(), 0));
        self
    }

    #[must_use]
    pub fn with_delayed(mut self, text: &str, translated: &str, delay_ms: u64) -> Self {
        self.map
            .insert(text.to_string(), (translated.to_string(), delay_ms));
        self
    }

    /// (text, from, to) triples seen so far
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MappingTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for MappingTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), from.to_string(), to.to_string()));

        match self.map.get(text) {
            Some((translated, delay_ms)) => {
                if *delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
                translated.clone()
            }
            None => String::new(),
        }
    }
}

/// Host synthesizer fake that records every utterance
pub struct RecordingSynth {
    voices: Vec<SynthVoice>,
    spoken: Mutex<Vec<(String, String)>>,
}

impl RecordingSynth {
    /// A synthesizer offering one standard-quality voice per (id, lang) pair
    pub fn with_voices(voices: &[(&str, &str)]) -> Self {
        Self {
            voices: voices
                .iter()
                .map(|(id, lang)| SynthVoice {
                    id: (*id).to_string(),
                    lang: (*lang).to_string(),
                    quality: VoiceQuality::Standard,
                })
                .collect(),
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// (text, voice id) pairs spoken so far
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeSynthesizer for RecordingSynth {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<SynthVoice> {
        self.voices.clone()
    }

    async fn speak(&self, text: &str, voice: &SynthVoice, _params: SpeechParams) -> Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), voice.id.clone()));
        Ok(())
    }

    fn cancel(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Microphone access fake recording every request
pub struct FakeMic {
    deny: bool,
    requests: Mutex<Vec<Option<String>>>,
}

impl FakeMic {
    pub fn granting() -> Self {
        Self {
            deny: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn denying() -> Self {
        Self {
            deny: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Device ids requested so far
    pub fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MicrophoneAccess for FakeMic {
    async fn request(&self, device_id: Option<&str>) -> Result<()> {
        self.requests
            .lock()
            .unwrap()
            .push(device_id.map(str::to_string));

        if self.deny {
            Err(Error::PermissionDenied("access denied".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Everything a session test needs, wired over fakes
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub translator: Arc<MappingTranslator>,
    pub mic: Arc<FakeMic>,
    pub settings: Arc<SettingsStore>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(
        mic: FakeMic,
        recognizer: ScriptedRecognizer,
        translator: MappingTranslator,
    ) -> Self {
        Self::with_pair(mic, recognizer, translator, "fr-FR", "en-US").unwrap()
    }

    /// A harness whose voice output goes to a recording host synthesizer
    pub fn with_synth(
        mic: FakeMic,
        recognizer: ScriptedRecognizer,
        translator: MappingTranslator,
        synth: Arc<RecordingSynth>,
    ) -> Self {
        Self::build(
            mic,
            recognizer,
            translator,
            synth,
            VoiceMethod::Native,
            "fr-FR",
            "en-US",
        )
        .unwrap()
    }

    pub fn with_pair(
        mic: FakeMic,
        recognizer: ScriptedRecognizer,
        translator: MappingTranslator,
        source: &str,
        target: &str,
    ) -> Result<Self> {
        // Voice disabled: no playback hardware involved
        Self::build(
            mic,
            recognizer,
            translator,
            Arc::new(NullSynthesizer),
            VoiceMethod::Disabled,
            source,
            target,
        )
    }

    fn build(
        mic: FakeMic,
        recognizer: ScriptedRecognizer,
        translator: MappingTranslator,
        synth: Arc<dyn NativeSynthesizer>,
        method: VoiceMethod,
        source: &str,
        target: &str,
    ) -> Result<Self> {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::open(dir.path()));

        settings.update(SettingsPatch {
            tts: Some(babel_gateway::settings::TtsPatch {
                method: Some(method),
                ..Default::default()
            }),
            ..Default::default()
        });

        let mic = Arc::new(mic);
        let recognizer = Arc::new(recognizer);
        let translator = Arc::new(translator);
        let voices = VoiceSelector::new(
            Arc::clone(&settings),
            synth,
            Arc::new(AudioPlayback::new(None)),
        );

        let orchestrator = Orchestrator::new(
            source,
            target,
            Arc::clone(&mic) as Arc<dyn MicrophoneAccess>,
            Arc::clone(&recognizer) as Arc<dyn SpeechRecognizer>,
            Arc::clone(&translator) as Arc<dyn Translator>,
            voices,
            Arc::clone(&settings),
        )?;

        Ok(Self {
            orchestrator,
            recognizer,
            translator,
            mic,
            settings,
            _dir: dir,
        })
    }
}
