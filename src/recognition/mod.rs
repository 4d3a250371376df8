//! Speech recognition
//!
//! The recognizer trait mirrors what platform recognition engines offer:
//! start a session with a language and alternative count, then receive a
//! result, an error, and an end notification as events.

pub mod backends;
pub mod matcher;

pub use matcher::match_answer;

use crate::locale::LocaleTag;
use crate::Result;
use std::fmt;

/// Default number of alternative transcriptions requested
pub const DEFAULT_MAX_ALTERNATIVES: u32 = 5;

/// Alert shown when no recognition engine is available
pub const RECOGNITION_UNSUPPORTED: &str =
    "Sorry, speech recognition is not supported on this platform.";

/// Alert shown when a reply matches none of the options
pub const NOT_RECOGNIZED: &str =
    "Response not recognized as one of the options. Please try again.";

/// Identifies one recognition session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecognitionId(pub u64);

impl fmt::Display for RecognitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recognition#{}", self.0)
    }
}

/// Settings for one recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub lang: LocaleTag,
    /// Deliver partial hypotheses while the user is still speaking
    pub interim_results: bool,
    /// Upper bound on alternative transcriptions per result
    pub max_alternatives: u32,
}

impl RecognitionConfig {
    pub fn new(lang: LocaleTag) -> Self {
        Self {
            lang,
            interim_results: false,
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
        }
    }
}

/// One candidate transcription
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub transcript: String,
    pub confidence: f32,
}

impl Alternative {
    pub fn new(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            confidence,
        }
    }
}

/// Progress of a recognition session
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Final result, alternatives ordered best first
    Result(Vec<Alternative>),
    /// Engine error code (e.g. `no-speech`, `not-allowed`)
    Error(String),
    /// Session is over; no more events follow
    End,
}

/// Speech recognizer trait
pub trait Recognizer {
    /// Begin listening; progress arrives as `Recognition(id, ..)` events
    fn start(&mut self, id: RecognitionId, config: &RecognitionConfig) -> Result<()>;

    /// Stop listening without delivering a result
    fn abort(&mut self) -> Result<()>;
}
