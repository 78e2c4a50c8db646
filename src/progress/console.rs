//! Console progress handler for interactive use

use super::{ProgressEvent, ProgressHandler};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Prints user notices to stdout and a dot per readiness poll
#[derive(Debug, Default)]
pub struct ConsoleHandler {
    /// A line of dots is open and needs terminating
    dots_pending: AtomicBool,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_dots(&self, out: &mut impl Write) {
        if self.dots_pending.swap(false, Ordering::SeqCst) {
            let _ = writeln!(out);
        }
    }
}

impl ProgressHandler for ConsoleHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match event {
            ProgressEvent::Notice { message } => {
                self.end_dots(&mut out);
                let _ = writeln!(out, "{}", message);
            }
            ProgressEvent::WaitingForInstances { running, desired } => {
                if (*running as u64) < u64::from(*desired) {
                    self.dots_pending.store(true, Ordering::SeqCst);
                    let _ = write!(out, ".");
                    let _ = out.flush();
                }
            }
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. } => {
                self.end_dots(&mut out);
            }
            ProgressEvent::Started { .. } | ProgressEvent::StateEntered { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_are_terminated() {
        let handler = ConsoleHandler::new();
        handler.on_progress(&ProgressEvent::WaitingForInstances {
            running: 0,
            desired: 1,
        });
        assert!(handler.dots_pending.load(Ordering::SeqCst));

        handler.on_progress(&ProgressEvent::Notice {
            message: "Service db running.".to_string(),
        });
        assert!(!handler.dots_pending.load(Ordering::SeqCst));
    }

    #[test]
    fn test_ready_poll_prints_no_dot() {
        let handler = ConsoleHandler::new();
        handler.on_progress(&ProgressEvent::WaitingForInstances {
            running: 2,
            desired: 2,
        });
        assert!(!handler.dots_pending.load(Ordering::SeqCst));
    }
}
