//! Speech synthesis system

pub mod backends;
pub mod output;
pub mod synth;
pub mod voice;

pub use output::{SpeakOutcome, SpeechOutput, SYNTHESIS_UNSUPPORTED};
pub use synth::{create_synth, Synthesizer, Utterance, UtteranceId};
pub use voice::{select_voice, Voice};
