//! Per-turn request assembly.
//!
//! A [`ChatRequest`] gathers everything one user turn is answered from:
//! system prompt, memory snapshot, retrieved segments and tool
//! descriptors. Retrieved text is attached to the current user message
//! only; the memory keeps the plain text.

use ragline_core::document::ScoredSegment;
use ragline_core::message::Message;
use ragline_core::provider::ToolDefinition;

const CONTEXT_FENCE: &str = "---------------------";

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    /// Conversation window before this turn, oldest first.
    pub history: Vec<Message>,
    pub user_text: String,
    pub retrieved: Vec<ScoredSegment>,
    pub tools: Vec<ToolDefinition>,
}

impl ChatRequest {
    /// The context block appended to the user message, if anything was
    /// retrieved.
    pub fn context_block(&self) -> Option<String> {
        if self.retrieved.is_empty() {
            return None;
        }

        let context = self
            .retrieved
            .iter()
            .map(|s| s.segment.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n");

        Some(format!(
            "Context information is below, surrounded by {CONTEXT_FENCE}\n\n\
             {CONTEXT_FENCE}\n{context}\n{CONTEXT_FENCE}\n\n\
             Given the context and the conversation history, and not prior knowledge, \
             reply to the user comment. If the answer is not in the context, tell the \
             user that you can't answer the question."
        ))
    }

    /// The user message as sent to the model.
    pub fn user_message(&self) -> Message {
        match self.context_block() {
            Some(block) => Message::user(format!("{}\n\n{block}", self.user_text)),
            None => Message::user(self.user_text.clone()),
        }
    }

    /// System prompt, then history, then the (augmented) user message.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(self.history.iter().cloned());
        messages.push(self.user_message());
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::document::Segment;
    use ragline_core::message::Role;

    fn scored(text: &str, score: f32) -> ScoredSegment {
        ScoredSegment {
            segment: Segment::new("book.pdf", text, 0, 1),
            score,
        }
    }

    fn request(retrieved: Vec<ScoredSegment>) -> ChatRequest {
        ChatRequest {
            system_prompt: "You are a nutrition assistant.".into(),
            history: vec![Message::user("hi"), Message::assistant("hello")],
            user_text: "What about vitamin D?".into(),
            retrieved,
            tools: vec![],
        }
    }

    #[test]
    fn messages_are_ordered_system_history_user() {
        let messages = request(vec![]).to_messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[0].content, "You are a nutrition assistant.");
    }

    #[test]
    fn no_retrieval_leaves_user_text_alone() {
        let req = request(vec![]);
        assert!(req.context_block().is_none());
        assert_eq!(req.user_message().content, "What about vitamin D?");
    }

    #[test]
    fn retrieved_segments_augment_only_the_user_message() {
        let req = request(vec![
            scored("Vitamin D is made in skin.", 0.9),
            scored("Sunlight matters.", 0.5),
        ]);
        let messages = req.to_messages();
        let last = messages.last().unwrap();

        assert!(last.content.starts_with("What about vitamin D?"));
        assert!(last.content.contains("Vitamin D is made in skin.\n\nSunlight matters."));
        assert!(!messages[0].content.contains("Vitamin D is made"));
        assert_eq!(messages[1].content, "hi");
    }
}
