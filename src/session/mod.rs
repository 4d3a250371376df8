//! Survey session
//!
//! The Session is the central data structure: it owns the platform engines,
//! the form, and the locale resolved for this session, and runs the
//! speak → listen → match cycle for each question. Everything happens on
//! one thread; engines post events and the session dispatches them from
//! [`Session::pump`] or [`Session::run_until_idle`].

pub mod config;
pub mod phase;

use crate::locale::LocaleTag;
use crate::notify::Notifier;
use crate::platform::{EventReceiver, Platform, PlatformEvent};
use crate::recognition::{
    match_answer, RecognitionConfig, RecognitionEvent, RecognitionId, Recognizer,
    NOT_RECOGNIZED, RECOGNITION_UNSUPPORTED,
};
use crate::speech::{SpeakOutcome, SpeechOutput, Synthesizer};
use crate::survey::{Form, Question};
use crate::{Result, VoxpollError};
use config::Config;
use log::{debug, error, info, warn};
use phase::Phase;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Work to run once an asynchronous step completes
pub type Continuation = Box<dyn FnOnce(&mut Session) -> Result<()>>;

/// How long `run_until_idle` waits between checks
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a recognition session fills in
#[derive(Debug, Clone)]
enum ListenTarget {
    Answer {
        question_id: String,
        options: Vec<String>,
    },
    TextInput {
        input_id: String,
    },
}

#[derive(Debug)]
struct ActiveRecognition {
    id: RecognitionId,
    target: ListenTarget,
    /// A result or error has been handled; later ones are ignored
    resolved: bool,
}

/// A running survey
pub struct Session {
    /// Configuration the session was built from
    pub config: Config,

    /// Preferred locale, resolved once in [`Session::new`]
    locale: LocaleTag,

    synth: Option<Box<dyn Synthesizer>>,
    recognizer: Option<Box<dyn Recognizer>>,
    notifier: Box<dyn Notifier>,
    events: EventReceiver,

    speech: SpeechOutput<Continuation>,

    questions: Vec<Question>,
    form: Form,
    phases: HashMap<String, Phase>,

    recognition: Option<ActiveRecognition>,
    next_recognition: u64,
}

/// Reborrow a boxed engine as a plain trait object
fn synth_mut(synth: &mut Option<Box<dyn Synthesizer>>) -> Option<&mut dyn Synthesizer> {
    match synth {
        Some(synth) => Some(synth.as_mut()),
        None => None,
    }
}

impl Session {
    /// Create a session for `questions` on `platform`
    ///
    /// The preferred locale is resolved here from the configured language
    /// and stays fixed for the session.
    pub fn new(config: Config, platform: Platform, questions: Vec<Question>) -> Self {
        let language = config.language();
        let locale = config.locale_map().resolve(&language);
        info!("Preferred language {:?} resolved to {}", language, locale);

        if platform.synth.is_none() {
            warn!("No speech synthesis available");
        }
        if platform.recognizer.is_none() {
            warn!("No speech recognition available");
        }

        let mut speech = SpeechOutput::new();
        speech.set_rate(config.rate());
        speech.set_volume(config.volume());

        let form = Form::from_questions(&questions, config.highlight());
        info!("Session ready with {} questions", questions.len());

        Self {
            config,
            locale,
            synth: platform.synth,
            recognizer: platform.recognizer,
            notifier: platform.notifier,
            events: platform.events,
            speech,
            questions,
            form,
            phases: HashMap::new(),
            recognition: None,
            next_recognition: 0,
        }
    }

    /// The preferred locale used for synthesis and recognition
    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    /// Current answers by field name
    pub fn answers(&self) -> BTreeMap<String, String> {
        self.form.answers()
    }

    /// Progress of a question (`Idle` if never started)
    pub fn phase(&self, question_id: &str) -> Phase {
        self.phases.get(question_id).cloned().unwrap_or_default()
    }

    fn set_phase(&mut self, question_id: &str, phase: Phase) {
        debug!("Question {} is now {}", question_id, phase);
        self.phases.insert(question_id.to_string(), phase);
    }

    /// Speak text in the preferred locale; `on_end` runs exactly once
    ///
    /// When synthesis is unavailable or fails the user is alerted and
    /// `on_end` runs immediately.
    pub fn speak(&mut self, text: &str, on_end: Continuation) -> Result<()> {
        let outcome = self.speech.speak(
            synth_mut(&mut self.synth),
            self.notifier.as_mut(),
            text,
            &self.locale,
            on_end,
        );
        match outcome {
            SpeakOutcome::Started(id) => debug!("Queued {}", id),
            SpeakOutcome::Parked => debug!("Waiting for voices before speaking"),
            SpeakOutcome::Finished(on_end) => on_end(self)?,
        }
        Ok(())
    }

    /// Speak text with nothing to do afterwards
    pub fn speak_text(&mut self, text: &str) -> Result<()> {
        self.speak(text, Box::new(|_| Ok(())))
    }

    /// Read a question and its options aloud, then listen for the answer
    ///
    /// Listening starts only once the question has finished speaking.
    pub fn speak_question(&mut self, question: &Question) -> Result<()> {
        if self.phase(&question.id).is_active() {
            return Err(VoxpollError::Busy(question.id.clone()));
        }
        info!("Asking question {}", question.id);
        self.set_phase(&question.id, Phase::Speaking);

        let question_id = question.id.clone();
        let options = question.options.clone();
        self.speak(
            &question.spoken_text(),
            Box::new(move |session: &mut Session| {
                session.listen_after_speech(&question_id, &options)
            }),
        )
    }

    /// Ask a question by id
    pub fn ask(&mut self, question_id: &str) -> Result<()> {
        let question = self
            .question(question_id)
            .cloned()
            .ok_or_else(|| VoxpollError::UnknownQuestion(question_id.to_string()))?;
        self.speak_question(&question)
    }

    /// Listen for a spoken reply and match it against `options`
    ///
    /// Rejected with `Busy` while the question is still being spoken or
    /// listened for.
    pub fn listen_for_answer(&mut self, question_id: &str, options: &[String]) -> Result<()> {
        if self.phase(question_id).is_active() {
            return Err(VoxpollError::Busy(question_id.to_string()));
        }
        self.listen_after_speech(question_id, options)
    }

    /// Move a question on from `Speaking` once its prompt has finished
    fn listen_after_speech(&mut self, question_id: &str, options: &[String]) -> Result<()> {
        if self.phase(question_id) == Phase::Listening {
            return Err(VoxpollError::Busy(question_id.to_string()));
        }
        let target = ListenTarget::Answer {
            question_id: question_id.to_string(),
            options: options.to_vec(),
        };
        if !self.start_recognition(target)? {
            return Ok(());
        }
        self.set_phase(question_id, Phase::Listening);
        Ok(())
    }

    /// Listen for free text and write the transcript into a text input
    pub fn listen_for_text_input(&mut self, input_id: &str) -> Result<()> {
        let target = ListenTarget::TextInput {
            input_id: input_id.to_string(),
        };
        self.start_recognition(target)?;
        Ok(())
    }

    /// Speak `prompt`, then dictate the reply into text input `input_id`
    ///
    /// The input is added to the form if it is not there yet.
    pub fn ask_text_input(&mut self, input_id: &str, prompt: &str) -> Result<()> {
        self.form.add_input(input_id);
        let input_id = input_id.to_string();
        self.speak(
            prompt,
            Box::new(move |session: &mut Session| session.listen_for_text_input(&input_id)),
        )
    }

    /// Start a recognition session; false if it could not start
    fn start_recognition(&mut self, target: ListenTarget) -> Result<bool> {
        if self.recognizer.is_none() {
            self.notifier.alert(RECOGNITION_UNSUPPORTED);
            self.fail_target(&target, "unsupported");
            return Ok(false);
        }
        if let Some(active) = &self.recognition {
            warn!("{} still active, aborting it", active.id);
            self.abort_recognition()?;
        }

        let id = RecognitionId(self.next_recognition);
        self.next_recognition += 1;

        let config = RecognitionConfig {
            lang: self.locale.clone(),
            interim_results: self.config.interim_results(),
            max_alternatives: self.config.max_alternatives(),
        };

        let started = match self.recognizer.as_mut() {
            Some(recognizer) => recognizer.start(id, &config),
            None => return Ok(false),
        };
        if let Err(e) = started {
            error!("Failed to start recognition: {}", e);
            self.notifier
                .alert(&format!("Speech recognition error: {}", e));
            self.fail_target(&target, &e.to_string());
            return Ok(false);
        }

        debug!("Started {} ({}, {} alternatives)", id, config.lang, config.max_alternatives);
        self.recognition = Some(ActiveRecognition {
            id,
            target,
            resolved: false,
        });
        Ok(true)
    }

    fn fail_target(&mut self, target: &ListenTarget, reason: &str) {
        if let ListenTarget::Answer { question_id, .. } = target {
            self.set_phase(question_id, Phase::Error(reason.to_string()));
        }
    }

    fn abort_recognition(&mut self) -> Result<()> {
        if let Some(active) = self.recognition.take() {
            if let ListenTarget::Answer { question_id, .. } = &active.target {
                if self.phase(question_id).is_active() {
                    self.set_phase(question_id, Phase::Idle);
                }
            }
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.abort()?;
            }
        }
        Ok(())
    }

    /// Handle one platform event
    pub fn handle_event(&mut self, event: PlatformEvent) -> Result<()> {
        match event {
            PlatformEvent::VoicesChanged => {
                let finished = self
                    .speech
                    .voices_changed(synth_mut(&mut self.synth), self.notifier.as_mut());
                for on_end in finished {
                    on_end(self)?;
                }
            }
            PlatformEvent::SpeechEnded(id) => {
                if let Some(on_end) = self.speech.speech_ended(id) {
                    debug!("{} finished", id);
                    on_end(self)?;
                }
            }
            PlatformEvent::Recognition(id, event) => self.handle_recognition(id, event)?,
        }
        Ok(())
    }

    fn handle_recognition(&mut self, id: RecognitionId, event: RecognitionEvent) -> Result<()> {
        let active = match self.recognition.as_mut() {
            Some(active) if active.id == id => active,
            _ => {
                debug!("Ignoring event for stale {}", id);
                return Ok(());
            }
        };

        match event {
            RecognitionEvent::Result(alternatives) => {
                if active.resolved {
                    debug!("{} already resolved, ignoring extra result", id);
                    return Ok(());
                }
                active.resolved = true;
                let target = active.target.clone();
                let transcript = alternatives
                    .into_iter()
                    .next()
                    .map(|alt| alt.transcript)
                    .unwrap_or_default();
                debug!("{} heard {:?}", id, transcript);
                self.apply_transcript(target, &transcript);
            }
            RecognitionEvent::Error(code) => {
                if active.resolved {
                    return Ok(());
                }
                active.resolved = true;
                let target = active.target.clone();
                warn!("{} failed: {}", id, code);
                self.notifier
                    .alert(&format!("Speech recognition error: {}", code));
                self.fail_target(&target, &code);
            }
            RecognitionEvent::End => {
                let resolved = active.resolved;
                if let Some(ActiveRecognition { target, .. }) = self.recognition.take() {
                    if let ListenTarget::Answer { question_id, .. } = target {
                        if !resolved {
                            debug!("{} ended without a result", id);
                            self.set_phase(&question_id, Phase::Unmatched);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_transcript(&mut self, target: ListenTarget, transcript: &str) {
        match target {
            ListenTarget::Answer {
                question_id,
                options,
            } => match match_answer(transcript, &options) {
                Some(option) => {
                    info!("Question {} answered {:?}", question_id, option);
                    if !self.form.select(&question_id, option) {
                        warn!("Form has no radio {:?} for {}", option, question_id);
                    }
                    self.set_phase(&question_id, Phase::Matched(option.to_string()));
                }
                None => {
                    info!("No option of {} in {:?}", question_id, transcript);
                    self.notifier.alert(NOT_RECOGNIZED);
                    self.set_phase(&question_id, Phase::Unmatched);
                }
            },
            ListenTarget::TextInput { input_id } => {
                if !self.form.set_input(&input_id, transcript) {
                    warn!("Form has no text input {}", input_id);
                }
            }
        }
    }

    /// Dispatch every event already queued; returns how many were handled
    pub fn pump(&mut self) -> Result<usize> {
        self.poll_engines();
        let mut handled = 0;
        while let Some(event) = self.events.try_recv()? {
            self.dispatch(event);
            handled += 1;
        }
        Ok(handled)
    }

    /// Block until no speech or recognition is outstanding
    ///
    /// There is no timeout: an engine that never reports back stalls here
    /// until [`Session::cancel`] is called from elsewhere.
    pub fn run_until_idle(&mut self) -> Result<()> {
        while self.is_busy() {
            self.poll_engines();
            if let Some(event) = self.events.recv_timeout(POLL_INTERVAL)? {
                self.dispatch(event);
            }
        }
        Ok(())
    }

    /// Let engines post what they only learn by being asked
    fn poll_engines(&mut self) {
        if let Some(synth) = self.synth.as_mut() {
            if let Err(e) = synth.poll() {
                warn!("Speech engine poll failed: {}", e);
            }
        }
    }

    fn dispatch(&mut self, event: PlatformEvent) {
        debug!("Dispatching {:?}", event);
        if let Err(e) = self.handle_event(event) {
            error!("Error handling platform event: {}", e);
        }
    }

    /// Speech or recognition still outstanding
    pub fn is_busy(&self) -> bool {
        self.speech.is_busy() || self.recognition.is_some()
    }

    /// Stop speaking and listening, dropping pending continuations
    pub fn cancel(&mut self) -> Result<()> {
        info!("Cancelling speech and recognition");
        let dropped = self.speech.cancel();
        if dropped > 0 {
            debug!("Dropped {} pending speech completions", dropped);
        }
        if let Some(synth) = self.synth.as_mut() {
            synth.cancel()?;
        }
        self.abort_recognition()?;

        let active: Vec<String> = self
            .phases
            .iter()
            .filter(|(_, phase)| phase.is_active())
            .map(|(id, _)| id.clone())
            .collect();
        for id in active {
            self.set_phase(&id, Phase::Idle);
        }
        Ok(())
    }
}
