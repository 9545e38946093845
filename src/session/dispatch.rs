//! Query dispatch
//!
//! One cycle at a time: idle → validating → in flight → resolved. A submit
//! while a cycle is in flight is dropped, not queued. Every cycle ends with
//! exactly one answer appended to the group it opened, and the gate is
//! released before that answer is written.

use super::{SessionController, SessionEvent};
use crate::backend::QueryRequest;
use crate::error::{Error, Result};
use crate::models::Severity;
use crate::source::ContextSource;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix of every answer that reports a failure
pub const ERROR_MARKER: &str = "❌";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A cycle was already in flight
    Ignored,
    /// The trimmed question was empty
    Empty,
    /// Validation failed; nothing was sent
    Rejected,
    Dispatched { group_id: u64 },
}

/// Turn a settled query into the answer shown in its group
pub fn answer_for(outcome: Result<String>) -> String {
    match outcome {
        Ok(text) => text,
        Err(Error::Service(message)) => format!("{} Error: {}", ERROR_MARKER, message),
        Err(Error::Transport(message)) => {
            format!("{} Could not reach the server: {}", ERROR_MARKER, message)
        }
        Err(other) => format!("{} Could not reach the server: {}", ERROR_MARKER, other),
    }
}

impl SessionController {
    /// Set the input and submit it
    pub fn ask(&mut self, question: impl Into<String>) -> SubmitOutcome {
        self.set_input(question);
        self.submit()
    }

    /// Submit the current input as a question
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.in_flight.is_some() {
            debug!("Submit ignored: a query is already in flight");
            return SubmitOutcome::Ignored;
        }

        let question = self.input.trim().to_string();
        if question.is_empty() {
            return SubmitOutcome::Empty;
        }

        if let Err(e) = self.validate() {
            info!("Query rejected: {}", e);
            let message = match e {
                Error::Validation(message) => message,
                other => other.to_string(),
            };
            self.notify(message, Severity::Warning);
            return SubmitOutcome::Rejected;
        }

        let group_id = self.chat.open_group(question.clone());
        self.input.clear();
        self.in_flight = Some(group_id);

        let request = QueryRequest::build(
            &question,
            self.selector.active(),
            self.documents.documents(),
        );
        info!(
            group_id,
            source = %self.selector.active(),
            files = request.pdf_files.as_ref().map_or(0, Vec::len),
            "Dispatching query"
        );
        self.send_query(group_id, request);

        SubmitOutcome::Dispatched { group_id }
    }

    fn validate(&self) -> Result<()> {
        if self.selector.active() == ContextSource::Uploads
            && self.documents.is_empty()
        {
            return Err(Error::Validation(
                "Upload at least one PDF or switch the context source".to_string(),
            ));
        }
        Ok(())
    }

    fn send_query(&self, group_id: u64, request: QueryRequest) {
        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(async move { backend.respond(&request).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(Error::Transport("query task panicked".to_string())));
            let _ = tx.send(SessionEvent::QueryFinished { group_id, outcome });
        });
    }

    /// Settle the in-flight cycle for `group_id`
    pub(super) fn resolve(&mut self, group_id: u64, outcome: Result<String>) {
        match self.in_flight.take() {
            Some(pending) if pending == group_id => {}
            other => {
                warn!(group_id, pending = ?other, "Stray query result ignored");
                self.in_flight = other;
                return;
            }
        }

        let failed = outcome.is_err();
        let answer = answer_for(outcome);
        if failed {
            warn!(group_id, "Query failed: {}", answer);
        } else {
            info!(group_id, "Query answered");
        }
        self.chat.append_answer(group_id, answer);
    }
}
