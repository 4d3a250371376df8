//! Survey model: questions and the form they fill

pub mod form;
pub mod question;

pub use form::{Container, Form, Radio, RadioGroup, DEFAULT_HIGHLIGHT};
pub use question::{load_questions, parse_questions, Question};
