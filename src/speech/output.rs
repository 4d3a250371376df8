//! Speech output with completion tracking
//!
//! Wraps a [`Synthesizer`] so that every `speak` request ends in exactly one
//! completion, whether the utterance played, failed, or the platform cannot
//! speak at all. Requests made before the engine has any voices are parked
//! and released together the first time voices show up.

use super::synth::{Synthesizer, Utterance, UtteranceId};
use super::voice::select_voice;
use crate::locale::LocaleTag;
use crate::notify::Notifier;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Alert shown when no synthesis engine is available
pub const SYNTHESIS_UNSUPPORTED: &str =
    "Sorry, speech synthesis is not supported on this platform.";

/// What happened to a speak request
#[derive(Debug)]
pub enum SpeakOutcome<C> {
    /// Handed to the engine; the completion fires on `SpeechEnded`
    Started(UtteranceId),
    /// Waiting for the engine's voice list
    Parked,
    /// Nothing will be spoken; the caller must fire the completion now
    Finished(C),
}

struct Parked<C> {
    text: String,
    locale: LocaleTag,
    on_end: C,
}

enum Readiness<C> {
    Waiting(Vec<Parked<C>>),
    Ready,
}

/// Speech output state, generic over the completion type
pub struct SpeechOutput<C> {
    readiness: Readiness<C>,
    pending: HashMap<UtteranceId, C>,
    next_id: u64,
    rate: Option<u8>,
    volume: Option<u8>,
}

impl<C> SpeechOutput<C> {
    pub fn new() -> Self {
        Self {
            readiness: Readiness::Waiting(Vec::new()),
            pending: HashMap::new(),
            next_id: 0,
            rate: None,
            volume: None,
        }
    }

    /// Rate applied to every utterance (0-100)
    pub fn set_rate(&mut self, rate: Option<u8>) {
        self.rate = rate;
    }

    /// Volume applied to every utterance (0-100)
    pub fn set_volume(&mut self, volume: Option<u8>) {
        self.volume = volume;
    }

    /// Speak `text` in `locale`, tracking `on_end`
    pub fn speak(
        &mut self,
        synth: Option<&mut dyn Synthesizer>,
        notifier: &mut dyn Notifier,
        text: &str,
        locale: &LocaleTag,
        on_end: C,
    ) -> SpeakOutcome<C> {
        let synth = match synth {
            Some(synth) => synth,
            None => {
                notifier.alert(SYNTHESIS_UNSUPPORTED);
                return SpeakOutcome::Finished(on_end);
            }
        };

        if let Readiness::Waiting(parked) = &mut self.readiness {
            let voices_known = match synth.voices() {
                Ok(voices) => !voices.is_empty(),
                Err(e) => {
                    warn!("Could not list voices, using platform default: {}", e);
                    true
                }
            };
            // Earlier requests still parked keep their place in line
            if !voices_known || !parked.is_empty() {
                debug!("No voices yet, parking speech request");
                parked.push(Parked {
                    text: text.to_string(),
                    locale: locale.clone(),
                    on_end,
                });
                return SpeakOutcome::Parked;
            }
            self.mark_ready();
        }

        self.speak_now(synth, notifier, text, locale, on_end)
    }

    /// Handle `VoicesChanged`
    ///
    /// Releases parked requests the first time voices are available.
    /// Returns completions for requests that could not be spoken.
    pub fn voices_changed(
        &mut self,
        synth: Option<&mut dyn Synthesizer>,
        notifier: &mut dyn Notifier,
    ) -> Vec<C> {
        let synth = match synth {
            Some(synth) => synth,
            None => return Vec::new(),
        };
        if matches!(self.readiness, Readiness::Ready) {
            return Vec::new();
        }
        match synth.voices() {
            Ok(voices) if voices.is_empty() => {
                debug!("Voices changed but list is still empty");
                return Vec::new();
            }
            Ok(voices) => debug!("Engine reports {} voices", voices.len()),
            Err(e) => warn!("Could not list voices, using platform default: {}", e),
        }

        let parked = self.mark_ready();
        let mut finished = Vec::new();
        for request in parked {
            if let SpeakOutcome::Finished(on_end) =
                self.speak_now(synth, notifier, &request.text, &request.locale, request.on_end)
            {
                finished.push(on_end);
            }
        }
        finished
    }

    /// Handle `SpeechEnded`; `None` for unknown or already finished ids
    pub fn speech_ended(&mut self, id: UtteranceId) -> Option<C> {
        let on_end = self.pending.remove(&id);
        if on_end.is_none() {
            debug!("Ignoring end of untracked {}", id);
        }
        on_end
    }

    /// Drop every parked and in-flight completion
    pub fn cancel(&mut self) -> usize {
        let mut dropped = self.pending.len();
        self.pending.clear();
        if let Readiness::Waiting(parked) = &mut self.readiness {
            dropped += parked.len();
            parked.clear();
        }
        dropped
    }

    /// Whether any completion is still outstanding
    pub fn is_busy(&self) -> bool {
        let parked = match &self.readiness {
            Readiness::Waiting(parked) => !parked.is_empty(),
            Readiness::Ready => false,
        };
        parked || !self.pending.is_empty()
    }

    /// Whether the voice list has been seen non-empty
    pub fn is_ready(&self) -> bool {
        matches!(self.readiness, Readiness::Ready)
    }

    fn mark_ready(&mut self) -> Vec<Parked<C>> {
        info!("Speech voices ready");
        match std::mem::replace(&mut self.readiness, Readiness::Ready) {
            Readiness::Waiting(parked) => parked,
            Readiness::Ready => Vec::new(),
        }
    }

    fn speak_now(
        &mut self,
        synth: &mut dyn Synthesizer,
        notifier: &mut dyn Notifier,
        text: &str,
        locale: &LocaleTag,
        on_end: C,
    ) -> SpeakOutcome<C> {
        let voices = synth.voices().unwrap_or_else(|e| {
            warn!("Could not list voices: {}", e);
            Vec::new()
        });

        let mut utterance = Utterance::new(text, locale.clone());
        match select_voice(locale, &voices) {
            Some(voice) => {
                debug!("Selected voice {} ({}) for {}", voice.name, voice.lang, locale);
                utterance = utterance.with_voice(voice.clone());
            }
            None => debug!("No voice for {}, using platform default", locale),
        }
        utterance.rate = self.rate;
        utterance.volume = self.volume;

        let id = UtteranceId(self.next_id);
        self.next_id += 1;

        match synth.speak(id, &utterance) {
            Ok(()) => {
                debug!("Speaking {}: {}", id, text);
                self.pending.insert(id, on_end);
                SpeakOutcome::Started(id)
            }
            Err(e) => {
                notifier.alert(&format!("Speech synthesis error: {}", e));
                SpeakOutcome::Finished(on_end)
            }
        }
    }
}

impl<C> Default for SpeechOutput<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::Voice;
    use crate::{Result, VoxpollError};

    #[derive(Default)]
    struct FakeSynth {
        voices: Vec<Voice>,
        spoken: Vec<(UtteranceId, Utterance)>,
        fail: bool,
        no_voice_list: bool,
    }

    impl Synthesizer for FakeSynth {
        fn voices(&self) -> Result<Vec<Voice>> {
            if self.no_voice_list {
                return Err(VoxpollError::Speech("no voices reported".into()));
            }
            Ok(self.voices.clone())
        }

        fn speak(&mut self, id: UtteranceId, utterance: &Utterance) -> Result<()> {
            if self.fail {
                return Err(VoxpollError::Speech("engine down".into()));
            }
            self.spoken.push((id, utterance.clone()));
            Ok(())
        }

        fn cancel(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Alerts(Vec<String>);

    impl Notifier for Alerts {
        fn alert(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    fn tamil() -> LocaleTag {
        LocaleTag::new("ta-IN")
    }

    #[test]
    fn test_unsupported_finishes_immediately() {
        let mut output: SpeechOutput<u32> = SpeechOutput::new();
        let mut alerts = Alerts::default();
        let outcome = output.speak(None, &mut alerts, "hello", &tamil(), 7);
        assert!(matches!(outcome, SpeakOutcome::Finished(7)));
        assert_eq!(alerts.0, vec![SYNTHESIS_UNSUPPORTED.to_string()]);
        assert!(!output.is_busy());
    }

    #[test]
    fn test_speaks_with_selected_voice() {
        let mut output: SpeechOutput<u32> = SpeechOutput::new();
        output.set_rate(Some(60));
        let mut synth = FakeSynth {
            voices: vec![Voice::new("a", "A", "en-US"), Voice::new("b", "B", "ta-IN")],
            ..Default::default()
        };
        let mut alerts = Alerts::default();

        let outcome = output.speak(Some(&mut synth), &mut alerts, "vanakkam", &tamil(), 1);
        let id = match outcome {
            SpeakOutcome::Started(id) => id,
            other => panic!("unexpected outcome {:?}", other),
        };
        let (_, utterance) = &synth.spoken[0];
        assert_eq!(utterance.voice.as_ref().unwrap().id, "b");
        assert_eq!(utterance.rate, Some(60));
        assert!(output.is_busy());

        assert_eq!(output.speech_ended(id), Some(1));
        assert_eq!(output.speech_ended(id), None);
        assert!(!output.is_busy());
    }

    #[test]
    fn test_parks_until_voices_arrive() {
        let mut output: SpeechOutput<u32> = SpeechOutput::new();
        let mut synth = FakeSynth::default();
        let mut alerts = Alerts::default();

        assert!(matches!(
            output.speak(Some(&mut synth), &mut alerts, "one", &tamil(), 1),
            SpeakOutcome::Parked
        ));
        assert!(matches!(
            output.speak(Some(&mut synth), &mut alerts, "two", &tamil(), 2),
            SpeakOutcome::Parked
        ));
        assert!(synth.spoken.is_empty());

        // Still empty: nothing released
        assert!(output.voices_changed(Some(&mut synth), &mut alerts).is_empty());
        assert!(synth.spoken.is_empty());

        synth.voices.push(Voice::new("a", "A", "ta-IN"));
        assert!(output.voices_changed(Some(&mut synth), &mut alerts).is_empty());
        let texts: Vec<_> = synth.spoken.iter().map(|(_, u)| u.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert!(output.is_ready());

        // Readiness resolves once; later notifications do not respeak
        output.voices_changed(Some(&mut synth), &mut alerts);
        assert_eq!(synth.spoken.len(), 2);
    }

    #[test]
    fn test_voice_list_error_releases_parked() {
        let mut output: SpeechOutput<u32> = SpeechOutput::new();
        let mut synth = FakeSynth::default();
        let mut alerts = Alerts::default();
        output.speak(Some(&mut synth), &mut alerts, "one", &tamil(), 1);
        assert!(synth.spoken.is_empty());

        synth.no_voice_list = true;
        assert!(output.voices_changed(Some(&mut synth), &mut alerts).is_empty());
        assert!(output.is_ready());
        assert_eq!(synth.spoken.len(), 1);
        assert_eq!(synth.spoken[0].1.voice, None);
        assert_eq!(synth.spoken[0].1.lang, tamil());
        assert!(alerts.0.is_empty());
    }

    #[test]
    fn test_engine_error_finishes() {
        let mut output: SpeechOutput<u32> = SpeechOutput::new();
        let mut synth = FakeSynth {
            voices: vec![Voice::new("a", "A", "en-US")],
            fail: true,
            ..Default::default()
        };
        let mut alerts = Alerts::default();
        let outcome = output.speak(Some(&mut synth), &mut alerts, "x", &tamil(), 3);
        assert!(matches!(outcome, SpeakOutcome::Finished(3)));
        assert_eq!(alerts.0.len(), 1);
        assert!(!output.is_busy());
    }

    #[test]
    fn test_cancel_drops_everything() {
        let mut output: SpeechOutput<u32> = SpeechOutput::new();
        let mut synth = FakeSynth::default();
        let mut alerts = Alerts::default();
        output.speak(Some(&mut synth), &mut alerts, "one", &tamil(), 1);
        assert_eq!(output.cancel(), 1);
        assert!(!output.is_busy());
    }
}
