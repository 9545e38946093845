//! CLI commands implementation

pub mod ask;
pub mod chat;
pub mod health;
pub mod init;

pub use ask::*;
pub use chat::*;
pub use health::*;
pub use init::*;

use crate::progress::print_line;
use crate::session::SessionController;

/// Prints each notification once, the moment it is raised
#[derive(Debug, Default)]
pub(crate) struct NoticePrinter {
    seen: u64,
}

impl NoticePrinter {
    pub(crate) fn poll(&mut self, session: &SessionController) {
        let generation = session.notification_generation();
        if generation == self.seen {
            return;
        }
        self.seen = generation;
        if let Some(notification) = session.notification() {
            print_line(format!("{} {}", notification.severity, notification.message));
        }
    }
}
