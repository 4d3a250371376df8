//! Native Rust TTS backend using the tts crate
//!
//! This backend uses the `tts` crate which provides a unified interface to:
//! - Speech Dispatcher on Linux (via native bindings)
//! - AVFoundation on macOS/iOS (via native bindings)
//! - WinRT / SAPI on Windows
//!
//! The end of an utterance is taken from the engine's utterance callbacks
//! where it has them, otherwise from polling `is_speaking` whenever the
//! session pumps. Either way it is posted as `SpeechEnded` on the session's
//! channel. The engine's voice list is checked the same way and announced
//! once with `VoicesChanged`.

use crate::platform::{EventSender, PlatformEvent};
use crate::speech::{Synthesizer, Utterance, UtteranceId, Voice};
use crate::{Result, VoxpollError};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tts::{Features, Tts as TtsCrate};

/// How long to wait for the engine to list its voices
const VOICE_WAIT: Duration = Duration::from_secs(3);

/// Engines can report not speaking for a moment after queueing
const START_GRACE: Duration = Duration::from_millis(250);

/// How the end of an utterance is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndDetection {
    /// The engine calls back when an utterance finishes
    Callbacks,
    /// Poll `is_speaking` until the engine goes quiet
    Polling,
    /// Neither is available; the end is reported once queued
    Immediate,
}

fn end_detection(features: &Features) -> EndDetection {
    if features.utterance_callbacks {
        EndDetection::Callbacks
    } else if features.is_speaking {
        EndDetection::Polling
    } else {
        EndDetection::Immediate
    }
}

/// Progress of the engine's voice list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceState {
    Waiting,
    Listed,
    /// No list is coming; speak with the platform default
    Unlisted,
}

fn voice_state(listed: usize, waited: Duration) -> VoiceState {
    if listed > 0 {
        VoiceState::Listed
    } else if waited >= VOICE_WAIT {
        VoiceState::Unlisted
    } else {
        VoiceState::Waiting
    }
}

/// Native TTS backend using the tts crate
pub struct NativeSynth {
    /// The tts crate's TTS instance
    tts: TtsCrate,

    /// Our ids for utterances the engine has not finished yet, in order
    in_flight: Arc<Mutex<VecDeque<UtteranceId>>>,

    end_detection: EndDetection,

    /// When the last utterance was queued, while polling for its end
    last_queued: Option<Instant>,

    voice_state: VoiceState,
    created: Instant,

    events: EventSender,
}

impl NativeSynth {
    /// Create a new native TTS synthesizer
    ///
    /// Initializes the platform-appropriate TTS backend and hooks its
    /// utterance-end callback up to the event channel.
    pub fn new(events: EventSender) -> Result<Self> {
        debug!("Creating native TTS backend");

        let mut tts = TtsCrate::default()
            .map_err(|e| VoxpollError::Speech(format!("Failed to initialize TTS: {}", e)))?;

        let in_flight = Arc::new(Mutex::new(VecDeque::new()));
        let detection = end_detection(&tts.supported_features());

        match detection {
            EndDetection::Callbacks => {
                let queue = Arc::clone(&in_flight);
                let sender = events.clone();
                tts.on_utterance_end(Some(Box::new(move |_| {
                    let finished = queue.lock().ok().and_then(|mut q| q.pop_front());
                    if let Some(id) = finished {
                        if sender.send(PlatformEvent::SpeechEnded(id)).is_err() {
                            debug!("Session gone, dropping end of {}", id);
                        }
                    }
                })))
                .map_err(|e| VoxpollError::Speech(format!("Failed to register callback: {}", e)))?;
            }
            EndDetection::Polling => info!("Engine has no utterance callbacks; polling for speech end"),
            EndDetection::Immediate => {
                warn!("Engine reports neither utterance ends nor speaking state; speech ends are reported on queueing")
            }
        }

        let mut synth = Self {
            tts,
            in_flight,
            end_detection: detection,
            last_queued: None,
            voice_state: VoiceState::Waiting,
            created: Instant::now(),
            events,
        };
        synth.check_voices()?;

        debug!("Native TTS backend created successfully");
        Ok(synth)
    }

    /// Announce the voice list once it is known (or known not to come)
    fn check_voices(&mut self) -> Result<()> {
        if self.voice_state != VoiceState::Waiting {
            return Ok(());
        }
        let next = match self.tts.voices() {
            Ok(voices) => voice_state(voices.len(), self.created.elapsed()),
            Err(e) => {
                debug!("Engine cannot list voices: {}", e);
                VoiceState::Unlisted
            }
        };
        if next == VoiceState::Waiting {
            return Ok(());
        }
        if next == VoiceState::Unlisted {
            warn!("Engine listed no voices, using platform default");
        }
        self.voice_state = next;
        self.events.send(PlatformEvent::VoicesChanged)
    }

    /// Report queued utterances finished once the engine goes quiet
    fn check_speaking(&mut self) -> Result<()> {
        let queued_at = match self.last_queued {
            Some(at) if self.end_detection == EndDetection::Polling => at,
            _ => return Ok(()),
        };
        if queued_at.elapsed() < START_GRACE {
            return Ok(());
        }
        let speaking = self
            .tts
            .is_speaking()
            .map_err(|e| VoxpollError::Speech(format!("Failed to query speaking state: {}", e)))?;
        if speaking {
            return Ok(());
        }

        self.last_queued = None;
        let finished: Vec<UtteranceId> = self
            .in_flight
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default();
        for id in finished {
            debug!("Engine quiet, {} finished", id);
            self.events.send(PlatformEvent::SpeechEnded(id))?;
        }
        Ok(())
    }

    /// Map a 0-100 rate (50 = normal) onto the engine's range
    fn convert_rate(&self, rate: u8) -> f32 {
        let (min, normal, max) = (
            self.tts.min_rate(),
            self.tts.normal_rate(),
            self.tts.max_rate(),
        );
        scale_around(rate, min, normal, max)
    }

    /// Map a 0-100 volume onto the engine's range
    fn convert_volume(&self, volume: u8) -> f32 {
        let (min, max) = (self.tts.min_volume(), self.tts.max_volume());
        min + (max - min) * (volume.min(100) as f32 / 100.0)
    }

    fn apply_voice(&mut self, voice: &Voice) -> Result<()> {
        if !self.tts.supported_features().voice {
            warn!("Voice selection not supported on this platform");
            return Ok(());
        }
        let voices = self
            .tts
            .voices()
            .map_err(|e| VoxpollError::Speech(format!("Failed to get voices: {}", e)))?;
        match voices.iter().find(|v| v.id() == voice.id) {
            Some(native) => self
                .tts
                .set_voice(native)
                .map_err(|e| VoxpollError::Speech(format!("Failed to set voice: {}", e))),
            None => {
                warn!("Voice {} no longer available", voice.id);
                Ok(())
            }
        }
    }
}

/// Piecewise-linear map of 0..=100 onto min..=max with 50 at `normal`
fn scale_around(value: u8, min: f32, normal: f32, max: f32) -> f32 {
    let value = value.min(100) as f32;
    if value <= 50.0 {
        min + (normal - min) * (value / 50.0)
    } else {
        normal + (max - normal) * ((value - 50.0) / 50.0)
    }
}

impl Synthesizer for NativeSynth {
    fn voices(&self) -> Result<Vec<Voice>> {
        if self.voice_state == VoiceState::Unlisted {
            return Err(VoxpollError::Speech("Engine did not list any voices".into()));
        }
        let voices = self
            .tts
            .voices()
            .map_err(|e| VoxpollError::Speech(format!("Failed to get voices: {}", e)))?;
        Ok(voices
            .iter()
            .map(|v| Voice::new(v.id(), v.name(), v.language().as_str()))
            .collect())
    }

    fn speak(&mut self, id: UtteranceId, utterance: &Utterance) -> Result<()> {
        if let Some(voice) = &utterance.voice {
            self.apply_voice(voice)?;
        }

        let features = self.tts.supported_features();
        if let Some(rate) = utterance.rate {
            if features.rate {
                let converted = self.convert_rate(rate);
                self.tts
                    .set_rate(converted)
                    .map_err(|e| VoxpollError::Speech(format!("Failed to set rate: {}", e)))?;
            } else {
                warn!("Rate control not supported on this platform");
            }
        }
        if let Some(volume) = utterance.volume {
            if features.volume {
                let converted = self.convert_volume(volume);
                self.tts
                    .set_volume(converted)
                    .map_err(|e| VoxpollError::Speech(format!("Failed to set volume: {}", e)))?;
            } else {
                warn!("Volume control not supported on this platform");
            }
        }

        debug!("Speaking {}: {}", id, utterance.text);
        let tracked = self.end_detection != EndDetection::Immediate;
        if tracked {
            if let Ok(mut queue) = self.in_flight.lock() {
                queue.push_back(id);
            }
        }

        if let Err(e) = self.tts.speak(utterance.text.as_str(), false) {
            error!("Failed to speak: {}", e);
            if tracked {
                if let Ok(mut queue) = self.in_flight.lock() {
                    queue.retain(|queued| *queued != id);
                }
            }
            return Err(VoxpollError::Speech(format!("Speak failed: {}", e)));
        }

        match self.end_detection {
            EndDetection::Callbacks => {}
            EndDetection::Polling => self.last_queued = Some(Instant::now()),
            EndDetection::Immediate => self.events.send(PlatformEvent::SpeechEnded(id))?,
        }
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.tts.stop().map_err(|e| {
            error!("Failed to cancel speech: {}", e);
            VoxpollError::Speech(format!("Cancel failed: {}", e))
        })?;
        if let Ok(mut queue) = self.in_flight.lock() {
            queue.clear();
        }
        self.last_queued = None;
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        self.check_voices()?;
        self.check_speaking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::event_channel;

    #[test]
    fn test_create_synth() {
        // May fail without speech-dispatcher (Linux) or in CI without audio
        let (tx, _rx) = event_channel();
        match NativeSynth::new(tx) {
            Ok(_) => println!("✓ Native TTS backend initialized successfully"),
            Err(e) => println!("⚠ TTS initialization failed (may be expected in CI): {}", e),
        }
    }

    #[test]
    fn test_end_detection() {
        let callbacks = Features {
            utterance_callbacks: true,
            is_speaking: true,
            ..Default::default()
        };
        assert_eq!(end_detection(&callbacks), EndDetection::Callbacks);

        let speaking_only = Features {
            is_speaking: true,
            ..Default::default()
        };
        assert_eq!(end_detection(&speaking_only), EndDetection::Polling);

        assert_eq!(end_detection(&Features::default()), EndDetection::Immediate);
    }

    #[test]
    fn test_voice_state() {
        assert_eq!(voice_state(2, Duration::ZERO), VoiceState::Listed);
        assert_eq!(voice_state(0, Duration::from_millis(100)), VoiceState::Waiting);
        assert_eq!(voice_state(0, VOICE_WAIT), VoiceState::Unlisted);
        assert_eq!(voice_state(1, VOICE_WAIT * 2), VoiceState::Listed);
    }

    #[test]
    fn test_scale_around() {
        assert_eq!(scale_around(0, 0.5, 1.0, 3.0), 0.5);
        assert_eq!(scale_around(50, 0.5, 1.0, 3.0), 1.0);
        assert_eq!(scale_around(100, 0.5, 1.0, 3.0), 3.0);
        assert_eq!(scale_around(75, 0.5, 1.0, 3.0), 2.0);
        assert_eq!(scale_around(200, 0.5, 1.0, 3.0), 3.0);
    }
}
