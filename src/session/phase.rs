//! Per-question progress

use std::fmt;

/// Where a question is in the speak → listen → match cycle
///
/// `Idle → Speaking → Listening → {Matched, Unmatched, Error}`. Terminal
/// states hand control back to the caller, who may start the question again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Speaking,
    Listening,
    /// The spoken reply selected this option
    Matched(String),
    Unmatched,
    /// Recognition failed or was unavailable
    Error(String),
}

impl Phase {
    /// Speaking or listening
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Speaking | Phase::Listening)
    }

    /// Matched, unmatched or failed; the attempt is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Matched(_) | Phase::Unmatched | Phase::Error(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::Speaking => f.write_str("speaking"),
            Phase::Listening => f.write_str("listening"),
            Phase::Matched(option) => write!(f, "matched {:?}", option),
            Phase::Unmatched => f.write_str("unmatched"),
            Phase::Error(reason) => write!(f, "error ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_terminal() {
        assert!(!Phase::Idle.is_active());
        assert!(!Phase::Idle.is_terminal());
        assert!(Phase::Speaking.is_active());
        assert!(Phase::Listening.is_active());
        assert!(!Phase::Listening.is_terminal());

        for phase in [
            Phase::Matched("yes".to_string()),
            Phase::Unmatched,
            Phase::Error("no-speech".to_string()),
        ] {
            assert!(phase.is_terminal(), "{} should be terminal", phase);
            assert!(!phase.is_active());
        }
    }
}
