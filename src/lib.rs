//! voxpoll - spoken survey engine
//!
//! Reads survey questions aloud in the user's preferred language and fills
//! in the answer from what the user says back. Speech synthesis and
//! recognition are platform capabilities behind the [`speech::Synthesizer`]
//! and [`recognition::Recognizer`] traits.

pub mod error;
pub mod locale;
pub mod notify;
pub mod platform;
pub mod recognition;
pub mod session;
pub mod speech;
pub mod survey;

pub use error::{Result, VoxpollError};
pub use session::Session;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "voxpoll";
