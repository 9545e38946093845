//! Single-slot notification queue
//!
//! There is no backlog: raising replaces whatever is showing. Every raise gets
//! a new generation number, and an expiry only clears the slot when it carries
//! the generation that is still showing.

use crate::models::{Notification, Severity};
use tracing::debug;

#[derive(Debug, Default)]
pub struct NotificationQueue {
    current: Option<Notification>,
    generation: u64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    /// Generation of the most recent raise (0 before any)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Show a notification, replacing any visible one. Returns its generation.
    pub fn raise(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        let message = message.into();
        debug!(%severity, %message, "Notification raised");
        self.generation += 1;
        self.current = Some(Notification { message, severity });
        self.generation
    }

    /// Clear the slot if `generation` is still the one showing.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.current.is_some() {
            self.current = None;
            true
        } else {
            false
        }
    }
}
