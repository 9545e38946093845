//! Chat session model
//!
//! An append-only sequence of message groups. Group ids come from a counter
//! that only moves forward; groups are never removed or reordered.

mod render;

pub use render::*;

use crate::models::MessageGroup;
use tracing::warn;

#[derive(Debug)]
pub struct ChatSession {
    groups: Vec<MessageGroup>,
    next_id: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            next_id: 1,
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[MessageGroup] {
        &self.groups
    }

    pub fn get(&self, id: u64) -> Option<&MessageGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Open a new group for `question` with no answers yet. Returns its id.
    pub fn open_group(&mut self, question: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.groups.push(MessageGroup {
            id,
            question: question.into(),
            answers: Vec::new(),
        });
        id
    }

    /// Append an answer to group `id`. Returns false if the group is unknown.
    pub fn append_answer(&mut self, id: u64, answer: impl Into<String>) -> bool {
        match self.groups.iter_mut().find(|g| g.id == id) {
            Some(group) => {
                group.answers.push(answer.into());
                true
            }
            None => {
                warn!(group_id = id, "Answer for unknown message group dropped");
                false
            }
        }
    }
}
