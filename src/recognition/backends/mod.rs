//! Recognition backends

// Typed transcripts from stdin, used by the terminal binary
pub mod console;
