//! Platform capabilities and the event channel they report on
//!
//! Synthesis and recognition engines run asynchronously. They never call
//! back into the session directly; they post a [`PlatformEvent`] which the
//! session dispatches from its pump.

use crate::notify::Notifier;
use crate::recognition::{RecognitionEvent, RecognitionId, Recognizer};
use crate::speech::{Synthesizer, UtteranceId};
use crate::{Result, VoxpollError};
use std::sync::mpsc;
use std::time::Duration;

/// Progress reported by a platform engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// The synthesis engine's voice list may have changed
    VoicesChanged,
    /// An utterance finished playing (or was dropped by the engine)
    SpeechEnded(UtteranceId),
    /// Progress of a recognition session
    Recognition(RecognitionId, RecognitionEvent),
}

/// Handle engines use to post events
#[derive(Debug, Clone)]
pub struct EventSender(mpsc::Sender<PlatformEvent>);

impl EventSender {
    /// Post an event; a closed channel means the session is gone
    pub fn send(&self, event: PlatformEvent) -> Result<()> {
        self.0.send(event).map_err(|_| VoxpollError::Channel)
    }
}

/// Receiving end, owned by the session
#[derive(Debug)]
pub struct EventReceiver(mpsc::Receiver<PlatformEvent>);

impl EventReceiver {
    /// Next event if one is already queued
    pub fn try_recv(&self) -> Result<Option<PlatformEvent>> {
        match self.0.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(VoxpollError::Channel),
        }
    }

    /// Block until an event arrives or the timeout elapses
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<PlatformEvent>> {
        match self.0.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(VoxpollError::Channel),
        }
    }
}

/// Create a connected sender/receiver pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (EventSender(tx), EventReceiver(rx))
}

/// The capabilities a session runs against
///
/// A `None` engine means the platform lacks that capability.
pub struct Platform {
    pub synth: Option<Box<dyn Synthesizer>>,
    pub recognizer: Option<Box<dyn Recognizer>>,
    pub notifier: Box<dyn Notifier>,
    pub events: EventReceiver,
}

impl Platform {
    pub fn new(
        synth: Option<Box<dyn Synthesizer>>,
        recognizer: Option<Box<dyn Recognizer>>,
        notifier: Box<dyn Notifier>,
        events: EventReceiver,
    ) -> Self {
        Self {
            synth,
            recognizer,
            notifier,
            events,
        }
    }
}
