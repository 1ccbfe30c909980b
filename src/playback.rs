//! Audio playback to speakers
//!
//! Plays decoded MP3 or raw samples through cpal. At most one playback is
//! active at a time: starting a new one supersedes the current one, and
//! [`AudioPlayback::cancel`] stops whatever is playing. Streams live entirely
//! inside `spawn_blocking` because cpal streams are not `Send`.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleRate;

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Plays audio to the selected (or default) output device
pub struct AudioPlayback {
    preferred_output: Mutex<Option<String>>,
    /// Supersede token; bumping it stops the playback holding the old value
    generation: Arc<AtomicU64>,
    active: Arc<AtomicBool>,
}

impl AudioPlayback {
    /// Create a playback instance
    ///
    /// `preferred_output` is a device id from the registry; `None` plays to
    /// the system default.
    #[must_use]
    pub fn new(preferred_output: Option<String>) -> Self {
        Self {
            preferred_output: Mutex::new(preferred_output),
            generation: Arc::new(AtomicU64::new(0)),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Change the preferred output device for subsequent playback
    pub fn set_preferred_output(&self, device_id: Option<String>) {
        if let Ok(mut preferred) = self.preferred_output.lock() {
            *preferred = device_id;
        }
    }

    /// Stop the active playback, if any; safe to call when idle
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether audio is currently playing
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Decode MP3 bytes and play them, superseding any active playback
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    pub async fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        let samples = decode_mp3(mp3_data)?;
        self.play_samples(samples).await
    }

    /// Play f32 samples, superseding any active playback
    ///
    /// Resolves until playback finishes, is superseded, or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available or the stream fails
    pub async fn play_samples(&self, samples: Vec<f32>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        // Claim a fresh token; any playback holding an older one stops.
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let active = Arc::clone(&self.active);
        let preferred = self
            .preferred_output
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default();

        tokio::task::spawn_blocking(move || run_stream(samples, token, &generation, &active, preferred.as_deref()))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

/// Build the output stream and block until done, superseded, or timed out
fn run_stream(
    samples: Vec<f32>,
    token: u64,
    generation: &AtomicU64,
    active: &AtomicBool,
    preferred: Option<&str>,
) -> Result<()> {
    let device = resolve_output(preferred)?;

    let supported_config = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
        })
        .or_else(|| {
            // Fallback: try stereo
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == 2
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
        })
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

    let config = supported_config
        .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
        .config();
    let channels = config.channels as usize;

    let sample_count = samples.len();
    let buffer: Arc<Vec<f32>> = Arc::new(samples);
    let position = Arc::new(AtomicU64::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let buffer_cb = Arc::clone(&buffer);
    let position_cb = Arc::clone(&position);
    let finished_cb = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = usize::try_from(position_cb.load(Ordering::Relaxed)).unwrap_or(usize::MAX);

                for frame in data.chunks_mut(channels) {
                    let sample = if pos < buffer_cb.len() {
                        let s = buffer_cb[pos];
                        pos += 1;
                        s
                    } else {
                        finished_cb.store(true, Ordering::Relaxed);
                        0.0
                    };

                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }

                position_cb.store(pos as u64, Ordering::Relaxed);
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    active.store(true, Ordering::SeqCst);

    let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(duration_ms + 500);

    while !finished.load(Ordering::Relaxed) {
        if generation.load(Ordering::SeqCst) != token {
            tracing::debug!("playback superseded");
            break;
        }
        if start.elapsed() > timeout {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    // Only clear the flag if no newer playback has claimed it
    if generation.load(Ordering::SeqCst) == token {
        active.store(false, Ordering::SeqCst);
    }

    drop(stream);
    tracing::debug!(samples = sample_count, "playback finished");
    Ok(())
}

/// Resolve the preferred output device, falling back to the default
fn resolve_output(preferred: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    if let Some(id) = preferred {
        let found = host
            .output_devices()
            .ok()
            .and_then(|mut devices| devices.find(|d| d.name().is_ok_and(|n| n == id)));
        if let Some(device) = found {
            return Ok(device);
        }
        tracing::warn!(device = id, "preferred output device unavailable, using default");
    }

    host.default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))
}

/// Decode MP3 bytes to f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                let frame_samples: Vec<f32> = if frame.channels == 2 {
                    // Stereo: average channels
                    frame
                        .data
                        .chunks(2)
                        .map(|chunk| {
                            let left = f32::from(chunk[0]) / 32768.0;
                            let right =
                                f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                            f32::midpoint(left, right)
                        })
                        .collect()
                } else {
                    frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect()
                };

                samples.extend(frame_samples);
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}
