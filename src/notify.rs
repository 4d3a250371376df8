//! User-facing alerts

use log::warn;

/// Blocking user notification surface
pub trait Notifier {
    /// Show a message the user has to acknowledge
    fn alert(&mut self, message: &str);
}

/// Prints alerts to stderr
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn alert(&mut self, message: &str) {
        warn!("Alert: {}", message);
        eprintln!("{}", message);
    }
}
