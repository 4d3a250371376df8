//! Speech synthesizer abstraction
//!
//! Provides a unified interface for text-to-speech engines. Engines report
//! completion asynchronously by posting [`PlatformEvent::SpeechEnded`] with
//! the id they were handed in [`Synthesizer::speak`].
//!
//! [`PlatformEvent::SpeechEnded`]: crate::platform::PlatformEvent::SpeechEnded

use super::voice::Voice;
use crate::locale::LocaleTag;
use crate::platform::EventSender;
use crate::Result;
use log::info;
use std::fmt;

/// Identifies one utterance handed to an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utterance#{}", self.0)
    }
}

/// A unit of synthesized speech
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Language the engine should speak in
    pub lang: LocaleTag,
    /// Voice to use; `None` means the platform default
    pub voice: Option<Voice>,
    /// Speech rate (0-100, where 50 is normal)
    pub rate: Option<u8>,
    /// Speech volume (0-100)
    pub volume: Option<u8>,
}

impl Utterance {
    pub fn new(text: impl Into<String>, lang: LocaleTag) -> Self {
        Self {
            text: text.into(),
            lang,
            voice: None,
            rate: None,
            volume: None,
        }
    }

    /// Use a voice; the voice's own tag becomes the utterance language
    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.lang = LocaleTag::new(voice.lang.clone());
        self.voice = Some(voice);
        self
    }
}

/// Speech synthesizer trait
///
/// All backends implement this to provide text-to-speech.
pub trait Synthesizer {
    /// Voices currently known to the engine
    ///
    /// May be empty while the engine is still initializing; the engine posts
    /// `VoicesChanged` once the list is populated. An engine that stops
    /// waiting for voices returns an error here and posts `VoicesChanged`,
    /// and speech then goes out with the platform default voice.
    fn voices(&self) -> Result<Vec<Voice>>;

    /// Queue an utterance; `SpeechEnded(id)` follows when it finishes
    ///
    /// `SpeechEnded` must not be posted before the audio has finished.
    fn speak(&mut self, id: UtteranceId, utterance: &Utterance) -> Result<()>;

    /// Silence current speech and drop queued utterances
    fn cancel(&mut self) -> Result<()>;

    /// Check engine state that is not reported through callbacks
    ///
    /// Called from the session's thread every time it pumps events.
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Create the platform speech synthesizer
///
/// Uses the native engine exposed by the `tts` crate (Speech Dispatcher on
/// Linux, AVFoundation on macOS, WinRT/SAPI on Windows).
pub fn create_synth(events: EventSender) -> Result<Box<dyn Synthesizer>> {
    info!(
        "Creating native speech synthesizer for platform: {}",
        std::env::consts::OS
    );
    use super::backends::native::NativeSynth;

    let synth = NativeSynth::new(events)?;
    info!("✓ Successfully initialized native TTS backend");
    Ok(Box::new(synth))
}
