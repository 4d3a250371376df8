//! Keyboard dictation stand-in for a recognition engine
//!
//! Each session takes one line from stdin and reports it as a
//! single-alternative result. An empty line is reported as `no-speech` and
//! end of input as `aborted`, the way platform engines report them.
//!
//! One reader thread lives for the whole recognizer and only reads when a
//! session wants a line. A line finished after its session was aborted is
//! held and handed to the next session, so a reply typed across an abort
//! is not lost.

use crate::platform::{EventSender, PlatformEvent};
use crate::recognition::{Alternative, RecognitionConfig, RecognitionEvent, RecognitionId, Recognizer};
use crate::{Result, VoxpollError};
use log::{debug, info};
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

/// Turn one line of input into the events a recognition session produces
fn line_events(line: Option<&str>) -> Vec<RecognitionEvent> {
    let outcome = match line.map(str::trim) {
        None => RecognitionEvent::Error("aborted".to_string()),
        Some("") => RecognitionEvent::Error("no-speech".to_string()),
        Some(text) => RecognitionEvent::Result(vec![Alternative::new(text, 1.0)]),
    };
    vec![outcome, RecognitionEvent::End]
}

/// A line of input; `None` is end of input
type Line = Option<String>;

/// What `start` should do next
#[derive(Debug, PartialEq)]
enum Demand {
    /// A line is already available for this session
    Deliver(Line),
    /// Ask the reader thread for a line
    Read,
    /// The reader is already reading; its line goes to this session
    Wait,
}

/// Which session gets the next line
#[derive(Debug, Default)]
struct LineRouter {
    active: Option<RecognitionId>,
    /// Read while no session was listening
    spare: Option<Line>,
    reading: bool,
    closed: bool,
}

impl LineRouter {
    fn start(&mut self, id: RecognitionId) -> Demand {
        if self.closed {
            return Demand::Deliver(None);
        }
        if let Some(line) = self.spare.take() {
            return Demand::Deliver(line);
        }
        self.active = Some(id);
        if self.reading {
            Demand::Wait
        } else {
            self.reading = true;
            Demand::Read
        }
    }

    fn abort(&mut self) -> Option<RecognitionId> {
        self.active.take()
    }

    /// A line arrived; the session it belongs to, if any is listening
    fn line(&mut self, line: Line) -> Option<(RecognitionId, Line)> {
        self.reading = false;
        if line.is_none() {
            self.closed = true;
        }
        match self.active.take() {
            Some(id) => Some((id, line)),
            None => {
                debug!("No session listening, holding line");
                self.spare = Some(line);
                None
            }
        }
    }
}

fn send_line(events: &EventSender, id: RecognitionId, line: Line) -> Result<()> {
    for event in line_events(line.as_deref()) {
        events.send(PlatformEvent::Recognition(id, event))?;
    }
    Ok(())
}

/// Reads typed transcripts from stdin
pub struct ConsoleRecognizer {
    events: EventSender,
    router: Arc<Mutex<LineRouter>>,
    /// Wakes the reader thread; spawned on first use
    reader: Option<mpsc::Sender<()>>,
}

impl ConsoleRecognizer {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            router: Arc::new(Mutex::new(LineRouter::default())),
            reader: None,
        }
    }

    fn router(&self) -> Result<std::sync::MutexGuard<'_, LineRouter>> {
        self.router
            .lock()
            .map_err(|_| VoxpollError::Recognition("Console reader state poisoned".into()))
    }

    fn spawn_reader(&self) -> Result<mpsc::Sender<()>> {
        let (wake, requests) = mpsc::channel::<()>();
        let router = Arc::clone(&self.router);
        let events = self.events.clone();

        thread::Builder::new()
            .name("dictation".to_string())
            .spawn(move || {
                while requests.recv().is_ok() {
                    let mut line = String::new();
                    let line = match io::stdin().lock().read_line(&mut line) {
                        Ok(0) | Err(_) => None,
                        Ok(_) => Some(line),
                    };
                    let eof = line.is_none();

                    let target = match router.lock() {
                        Ok(mut router) => router.line(line),
                        Err(_) => return,
                    };
                    if let Some((id, line)) = target {
                        if send_line(&events, id, line).is_err() {
                            debug!("Session gone, stopping console reader");
                            return;
                        }
                    }
                    if eof {
                        debug!("End of input, stopping console reader");
                        return;
                    }
                }
            })
            .map_err(|e| VoxpollError::Recognition(format!("Failed to start listener: {}", e)))?;
        Ok(wake)
    }
}

impl Recognizer for ConsoleRecognizer {
    fn start(&mut self, id: RecognitionId, config: &RecognitionConfig) -> Result<()> {
        info!("Listening ({}) for {}", config.lang, id);

        let demand = self.router()?.start(id);
        match demand {
            Demand::Deliver(line) => {
                debug!("{} takes a line already read", id);
                send_line(&self.events, id, line)
            }
            Demand::Wait => Ok(()),
            Demand::Read => {
                print!("Your answer [{}]: ", config.lang);
                io::stdout().flush()?;
                if self.reader.is_none() {
                    self.reader = Some(self.spawn_reader()?);
                }
                match &self.reader {
                    Some(wake) => wake
                        .send(())
                        .map_err(|_| VoxpollError::Recognition("Console reader stopped".into())),
                    None => Ok(()),
                }
            }
        }
    }

    fn abort(&mut self) -> Result<()> {
        let aborted = self.router()?.abort();
        if let Some(id) = aborted {
            debug!("Aborting {}", id);
            self.events
                .send(PlatformEvent::Recognition(id, RecognitionEvent::End))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_events() {
        assert_eq!(
            line_events(Some("  maybe later \n")),
            vec![
                RecognitionEvent::Result(vec![Alternative::new("maybe later", 1.0)]),
                RecognitionEvent::End
            ]
        );
        assert_eq!(
            line_events(Some("\n"))[0],
            RecognitionEvent::Error("no-speech".to_string())
        );
        assert_eq!(
            line_events(None)[0],
            RecognitionEvent::Error("aborted".to_string())
        );
    }

    #[test]
    fn test_line_goes_to_current_session() {
        let mut router = LineRouter::default();
        assert_eq!(router.start(RecognitionId(0)), Demand::Read);
        assert_eq!(router.abort(), Some(RecognitionId(0)));

        // The reader is still blocked; the next session waits on it
        assert_eq!(router.start(RecognitionId(1)), Demand::Wait);
        assert_eq!(
            router.line(Some("yes\n".to_string())),
            Some((RecognitionId(1), Some("yes\n".to_string())))
        );
        assert_eq!(router.start(RecognitionId(2)), Demand::Read);
    }

    #[test]
    fn test_line_after_abort_is_kept() {
        let mut router = LineRouter::default();
        router.start(RecognitionId(0));
        router.abort();
        assert_eq!(router.line(Some("blue\n".to_string())), None);

        assert_eq!(
            router.start(RecognitionId(1)),
            Demand::Deliver(Some("blue\n".to_string()))
        );
        assert_eq!(router.start(RecognitionId(2)), Demand::Read);
    }

    #[test]
    fn test_end_of_input_closes() {
        let mut router = LineRouter::default();
        router.start(RecognitionId(0));
        assert_eq!(router.line(None), Some((RecognitionId(0), None)));
        assert_eq!(router.start(RecognitionId(1)), Demand::Deliver(None));
    }
}
