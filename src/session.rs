//! Live translation session orchestration
//!
//! Composes speech capture, the translation client, and voice output into one
//! session: a continuous recognition stream feeds interim and final transcript
//! segments; each final segment is translated independently in a spawned task
//! whose result is appended on completion, and optionally spoken.
//!
//! Translation and synthesis are fire-and-forget relative to the recognition
//! stream: segment N+1 may begin capturing before segment N's translation
//! resolves, and under network latency translated segments may land out of
//! utterance order. In-flight translations are not cancelled by stop, swap, or
//! clear; their results are simply appended. Both are accepted properties of
//! the session model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::devices::MicrophoneAccess;
use crate::languages;
use crate::recognition::{RecognitionConfig, RecognitionEvent, SpeechRecognizer};
use crate::settings::SettingsStore;
use crate::translate::Translator;
use crate::voice::VoiceSelector;
use crate::{Error, Result};

/// Recognition side of a session
///
/// Voice playback is an orthogonal concurrent sub-state, queried separately
/// via [`Orchestrator::is_speaking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No capture in progress
    #[default]
    Idle,
    /// Continuous capture running
    Listening,
}

/// Source and target languages, always swapped as a unit
#[derive(Debug, Clone, Default)]
pub struct LanguagePair {
    /// BCP-47 tag of the spoken language
    pub source: String,
    /// BCP-47 tag translations are produced in
    pub target: String,
}

/// Accumulated session text
#[derive(Debug, Default)]
struct Transcripts {
    /// Committed recognized segments, single-space joined, in utterance order
    final_text: String,
    /// Most recent not-yet-final fragment, replaced wholesale
    interim: String,
    /// Translated segments, appended in completion order
    translated: String,
}

struct Inner {
    state: Mutex<SessionState>,
    /// Session generation; bumped on every start and stop. Consumer tasks
    /// capture the value current at their start and go inert once it moves
    /// on, so a stale stream ending cannot tear down a newer session.
    epoch: AtomicU64,
    pair: Mutex<LanguagePair>,
    text: Mutex<Transcripts>,
    mic: Arc<dyn MicrophoneAccess>,
    recognizer: Arc<dyn SpeechRecognizer>,
    translator: Arc<dyn Translator>,
    voices: VoiceSelector,
    settings: Arc<SettingsStore>,
}

/// Coordinates one live translation session
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Create an orchestrator over the given capabilities
    ///
    /// # Errors
    ///
    /// Returns error if either language is not in the catalog
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        mic: Arc<dyn MicrophoneAccess>,
        recognizer: Arc<dyn SpeechRecognizer>,
        translator: Arc<dyn Translator>,
        voices: VoiceSelector,
        settings: Arc<SettingsStore>,
    ) -> Result<Self> {
        let source = source.into();
        let target = target.into();
        for tag in [&source, &target] {
            if !languages::is_supported(tag) {
                return Err(Error::Config(format!("unknown language tag: {tag}")));
            }
        }

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::Idle),
                epoch: AtomicU64::new(0),
                pair: Mutex::new(LanguagePair { source, target }),
                text: Mutex::new(Transcripts::default()),
                mic,
                recognizer,
                translator,
                voices,
                settings,
            }),
        })
    }

    /// Start listening
    ///
    /// Requests input-device access scoped to the selected input id (or any
    /// default input), then begins continuous interim-enabled capture in the
    /// source language. Starting while already listening is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] when device access is refused (no
    /// session is created) and [`Error::Unsupported`] when no recognition
    /// engine is available.
    pub async fn start(&self) -> Result<()> {
        // Claim the next session slot while holding the state lock, so two
        // racing starts cannot both open a capture stream.
        let epoch = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if *state == SessionState::Listening {
                return Ok(());
            }
            *state = SessionState::Listening;
            self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1
        };

        match self.begin_capture(epoch).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Roll back the claim unless a newer start or stop took over
                if self.inner.epoch.load(Ordering::SeqCst) == epoch {
                    set_state(&self.inner, SessionState::Idle);
                }
                Err(e)
            }
        }
    }

    async fn begin_capture(&self, epoch: u64) -> Result<()> {
        let input_id = self.inner.settings.get().audio.input_id;
        self.inner.mic.request(input_id.as_deref()).await?;

        if !self.inner.recognizer.is_supported() {
            return Err(Error::Unsupported(
                "speech recognition unavailable, use text mode".to_string(),
            ));
        }

        let source = lock_or_default(&self.inner.pair, |p| p.source.clone());
        let rx = self
            .inner
            .recognizer
            .start(RecognitionConfig::live(&source))
            .await?;

        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            // A stop or newer start superseded this one mid-flight
            self.inner.recognizer.stop().await;
            return Ok(());
        }

        tracing::info!(language = %source, "listening");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(consume_events(inner, rx, epoch));
        Ok(())
    }

    /// Stop listening and cancel any active voice playback
    ///
    /// Idempotent: stopping when idle is a no-op. Accumulated transcripts
    /// survive; only the interim fragment is discarded.
    pub async fn stop(&self) {
        // Retire the current session; its consumer task goes inert
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.recognizer.stop().await;
        self.inner.voices.stop_all();
        set_state(&self.inner, SessionState::Idle);
        if let Ok(mut text) = self.inner.text.lock() {
            text.interim.clear();
        }
    }

    /// Exchange source and target languages atomically
    ///
    /// An in-flight session is stopped first (continuing would capture in a
    /// mismatched language) and all transcript and translation text is
    /// cleared. The session always ends up `Idle`.
    pub async fn swap(&self) {
        self.stop().await;

        if let Ok(mut pair) = self.inner.pair.lock() {
            let pair = &mut *pair;
            std::mem::swap(&mut pair.source, &mut pair.target);
            tracing::debug!(source = %pair.source, target = %pair.target, "languages swapped");
        }
        reset_text(&self.inner);
    }

    /// Stop and reset all transcript and translation text
    ///
    /// Device and language selections are untouched.
    pub async fn clear(&self) {
        self.stop().await;
        reset_text(&self.inner);
    }

    /// Speak the full accumulated translated text in the target language
    ///
    /// A no-op when nothing has been translated; recognition state is not
    /// affected.
    ///
    /// # Errors
    ///
    /// Returns error if voice playback fails
    pub async fn replay(&self) -> Result<()> {
        let translated = lock_or_default(&self.inner.text, |t| t.translated.clone());
        if translated.is_empty() {
            return Ok(());
        }

        let target = lock_or_default(&self.inner.pair, |p| p.target.clone());
        self.inner.voices.current().speak(&translated, &target).await
    }

    /// Translate arbitrary typed text with the current language pair
    ///
    /// Text mode shares the translation client and voice output but not the
    /// session transcripts. Empty output means translation was unavailable.
    pub async fn translate_text(&self, text: &str) -> String {
        let (from, to) = self.codes();
        self.inner.translator.translate(text, &from, &to).await
    }

    /// Speak arbitrary text in the target language
    ///
    /// # Errors
    ///
    /// Returns error if voice playback fails
    pub async fn speak_text(&self, text: &str) -> Result<()> {
        let target = lock_or_default(&self.inner.pair, |p| p.target.clone());
        self.inner.voices.current().speak(text, &target).await
    }

    /// Current recognition state
    #[must_use]
    pub fn state(&self) -> SessionState {
        lock_or_default(&self.inner.state, |s| *s)
    }

    /// Whether any voice backend is currently speaking
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.inner.voices.is_speaking()
    }

    /// Current language pair
    #[must_use]
    pub fn languages(&self) -> LanguagePair {
        lock_or_default(&self.inner.pair, Clone::clone)
    }

    /// Committed recognized text
    #[must_use]
    pub fn transcript(&self) -> String {
        lock_or_default(&self.inner.text, |t| t.final_text.clone())
    }

    /// Most recent not-yet-final fragment
    #[must_use]
    pub fn interim(&self) -> String {
        lock_or_default(&self.inner.text, |t| t.interim.clone())
    }

    /// Accumulated translated text
    #[must_use]
    pub fn translated(&self) -> String {
        lock_or_default(&self.inner.text, |t| t.translated.clone())
    }

    /// Whether recognition is available in this environment
    #[must_use]
    pub fn recognition_supported(&self) -> bool {
        self.inner.recognizer.is_supported()
    }

    fn codes(&self) -> (String, String) {
        lock_or_default(&self.inner.pair, |p| {
            (languages::to_iso2(&p.source), languages::to_iso2(&p.target))
        })
    }
}

/// Single consumer of one session's recognition stream
async fn consume_events(inner: Arc<Inner>, mut rx: mpsc::Receiver<RecognitionEvent>, epoch: u64) {
    while let Some(event) = rx.recv().await {
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            // This stream belongs to a retired session; drop the event and
            // leave the current session alone
            return;
        }

        match event {
            RecognitionEvent::Result {
                is_final: false,
                text,
                ..
            } => {
                if let Ok(mut t) = inner.text.lock() {
                    t.interim = text;
                }
            }
            RecognitionEvent::Result {
                is_final: true,
                text,
                ..
            } => {
                commit_segment(&inner, &text);
            }
            RecognitionEvent::Error(msg) => {
                tracing::warn!(error = %msg, "recognition failed, stopping session");
                break;
            }
            RecognitionEvent::End => {
                tracing::debug!("recognition stream ended");
                break;
            }
        }
    }

    // Terminal event or engine hangup; either way the session is over
    end_session(&inner, epoch).await;
}

/// Commit a final segment and dispatch its translation
fn commit_segment(inner: &Arc<Inner>, fragment: &str) {
    let fragment = fragment.trim().to_string();
    if fragment.is_empty() {
        return;
    }

    let (from, to, target_tag) = {
        let Ok(pair) = inner.pair.lock() else { return };
        (
            languages::to_iso2(&pair.source),
            languages::to_iso2(&pair.target),
            pair.target.clone(),
        )
    };

    if let Ok(mut text) = inner.text.lock() {
        append_joined(&mut text.final_text, &fragment);
        text.interim.clear();
    }

    // Translate this exact fragment, not the whole accumulated transcript.
    // Fire-and-forget: the recognition stream keeps flowing meanwhile.
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        let translated = inner.translator.translate(&fragment, &from, &to).await;
        if translated.is_empty() {
            // Translation unavailable; skip dependent voice output
            return;
        }

        if let Ok(mut text) = inner.text.lock() {
            append_joined(&mut text.translated, &translated);
        }

        if inner.settings.get().tts.auto_speak {
            let voice = inner.voices.current();
            if let Err(e) = voice.speak(&translated, &target_tag).await {
                tracing::warn!(error = %e, "voice output failed");
            }
        }
    });
}

/// Tear down after a terminal recognizer event
///
/// Claims the epoch before touching anything, so a consumer waking after its
/// session was stopped and a new one started cannot kill the new session.
async fn end_session(inner: &Arc<Inner>, epoch: u64) {
    if inner
        .epoch
        .compare_exchange(epoch, epoch + 1, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }

    inner.recognizer.stop().await;
    inner.voices.stop_all();
    set_state(inner, SessionState::Idle);
    if let Ok(mut text) = inner.text.lock() {
        text.interim.clear();
    }
}

fn set_state(inner: &Inner, state: SessionState) {
    if let Ok(mut s) = inner.state.lock() {
        *s = state;
    }
}

fn reset_text(inner: &Inner) {
    if let Ok(mut text) = inner.text.lock() {
        *text = Transcripts::default();
    }
}

fn append_joined(acc: &mut String, fragment: &str) {
    if acc.is_empty() {
        acc.push_str(fragment);
    } else {
        acc.push(' ');
        acc.push_str(fragment);
    }
}

fn lock_or_default<T, R>(mutex: &Mutex<T>, f: impl FnOnce(&T) -> R) -> R
where
    R: Default,
{
    mutex.lock().map(|guard| f(&guard)).unwrap_or_default()
}
