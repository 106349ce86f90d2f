//! Bounded conversation memory.
//!
//! Keeps the most recent turns of one session, oldest evicted first.
//! Bounded by message count and, optionally, by an estimated token budget.

use ragline_core::message::{Message, Role};
use std::collections::VecDeque;
use tracing::trace;

pub struct ConversationMemory {
    turns: VecDeque<Message>,
    max_messages: usize,
    max_tokens: Option<usize>,
}

impl ConversationMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_messages: max_messages.max(1),
            max_tokens: None,
        }
    }

    /// Also bound the window by estimated tokens. The newest turn is
    /// always kept, even if it alone is over budget.
    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Append a turn, evicting from the front until the bounds hold.
    pub fn append(&mut self, turn: Message) {
        self.turns.push_back(turn);
        self.evict();
    }

    /// Snapshot of the window, oldest first.
    pub fn window(&self) -> Vec<Message> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Estimated tokens across the window.
    pub fn estimated_tokens(&self) -> usize {
        self.turns.iter().map(Message::estimated_tokens).sum()
    }

    fn over_token_budget(&self) -> bool {
        self.max_tokens
            .is_some_and(|budget| self.turns.len() > 1 && self.estimated_tokens() > budget)
    }

    fn evict(&mut self) {
        let mut evicted = 0;
        while self.turns.len() > self.max_messages || self.over_token_budget() {
            self.turns.pop_front();
            evicted += 1;
        }
        if evicted == 0 {
            return;
        }
        // A tool result is meaningless once the call that asked for it is gone.
        while self.turns.front().is_some_and(|m| m.role == Role::Tool) {
            self.turns.pop_front();
            evicted += 1;
        }
        trace!(evicted, kept = self.turns.len(), "Memory window trimmed");
    }
}
