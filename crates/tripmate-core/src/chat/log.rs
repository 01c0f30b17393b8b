//! Ordered message timeline of one room.

use std::collections::HashSet;

use tripmate_types::chat::ChatMessage;

/// Messages in display order: fetched history first, then realtime
/// messages in the order they arrived.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
    history_loaded: bool,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `history` before everything already in the log.
    ///
    /// Only the first call has an effect; it returns `false` afterwards.
    /// Realtime messages that arrived early and also appear in the history
    /// (same persisted id) are kept once, at their history position.
    pub fn load_history(&mut self, history: Vec<ChatMessage>) -> bool {
        if self.history_loaded {
            return false;
        }
        self.history_loaded = true;

        let known: HashSet<i64> = history.iter().filter_map(|m| m.id).collect();
        let early = std::mem::replace(&mut self.messages, history);
        self.messages.extend(
            early
                .into_iter()
                .filter(|m| m.id.is_none_or(|id| !known.contains(&id))),
        );
        true
    }

    pub fn push_realtime(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn history_loaded(&self) -> bool {
        self.history_loaded
    }
}
