// ABOUTME: Ordered turn history of the discovery conversation with a single-flight busy gate
// ABOUTME: Append-only messages, bounded history windows for prompting, reset, and feedback capture

use std::collections::HashMap;

use tracing::{debug, info, warn};
use vitrine_core::{
    ChatMessage, Feedback, ImageRef, MessageFlag, MessageRole, ResolvedRecommendation,
};

use crate::error::{DiscoveryError, Result};

pub struct ConversationStore {
    messages: Vec<ChatMessage>,
    busy: bool,
    /// Bumped on every reset so late replies can tell their conversation is gone
    epoch: u64,
    feedback: HashMap<String, Feedback>,
    welcome_message: String,
}

impl ConversationStore {
    /// Create a conversation seeded with a single welcome turn
    pub fn new(welcome_message: impl Into<String>) -> Self {
        let mut store = Self {
            messages: Vec::new(),
            busy: false,
            epoch: 0,
            feedback: HashMap::new(),
            welcome_message: welcome_message.into(),
        };
        store.seed_welcome();
        store
    }

    fn seed_welcome(&mut self) {
        let welcome = ChatMessage::assistant(self.welcome_message.clone())
            .with_flag(MessageFlag::System);
        self.messages.push(welcome);
    }

    /// Append the user turn that begins a round-trip and mark the conversation busy.
    /// Rejected without appending anything while another round-trip is outstanding.
    pub fn append_user(
        &mut self,
        content: impl Into<String>,
        image_ref: Option<ImageRef>,
    ) -> Result<&ChatMessage> {
        if self.busy {
            warn!("Rejecting user turn: a round-trip is already outstanding");
            return Err(DiscoveryError::Busy);
        }

        self.busy = true;
        self.messages.push(ChatMessage::user(content, image_ref));
        debug!("Appended user turn #{}", self.messages.len());
        Ok(self.last())
    }

    /// Append the assistant turn that completes a round-trip and clear the busy flag
    pub fn append_assistant(
        &mut self,
        content: impl Into<String>,
        products: Option<Vec<ResolvedRecommendation>>,
        reasoning: Option<String>,
        suggestions: Option<Vec<String>>,
        flag: MessageFlag,
    ) -> &ChatMessage {
        let mut message = ChatMessage::assistant(content).with_flag(flag);
        if let Some(products) = products {
            message = message.with_products(products);
        }
        if let Some(reasoning) = reasoning {
            message = message.with_reasoning(reasoning);
        }
        if let Some(suggestions) = suggestions {
            message = message.with_suggestions(suggestions);
        }

        self.messages.push(message);
        self.busy = false;
        debug!(
            "Appended assistant turn #{} (flag: {:?})",
            self.messages.len(),
            flag
        );
        self.last()
    }

    /// Clear history and feedback, release the busy flag, and re-seed the welcome turn
    pub fn reset(&mut self) {
        info!(
            "Resetting conversation ({} messages discarded)",
            self.messages.len()
        );
        self.messages.clear();
        self.feedback.clear();
        self.busy = false;
        self.epoch += 1;
        self.seed_welcome();
    }

    /// The last `size` completed turns, oldest first, skipping error and system turns
    pub fn history_window(&self, size: usize) -> Vec<ChatMessage> {
        // While busy, the trailing user turn is still pending
        let completed = if self.busy {
            &self.messages[..self.messages.len().saturating_sub(1)]
        } else {
            &self.messages[..]
        };

        let mut window: Vec<ChatMessage> = completed
            .iter()
            .rev()
            .filter(|m| m.is_promptable())
            .take(size)
            .cloned()
            .collect();
        window.reverse();
        window
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn latest_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Capture feedback on an assistant turn. Replaces earlier feedback on the same turn.
    pub fn record_feedback(&mut self, message_id: &str, feedback: Feedback) -> Result<()> {
        let is_assistant_turn = self
            .messages
            .iter()
            .any(|m| m.id == message_id && m.role == MessageRole::Assistant);
        if !is_assistant_turn {
            return Err(DiscoveryError::MessageNotFound(message_id.to_string()));
        }

        info!("Feedback on message {}: {:?}", message_id, feedback);
        self.feedback.insert(message_id.to_string(), feedback);
        Ok(())
    }

    pub fn feedback(&self, message_id: &str) -> Option<Feedback> {
        self.feedback.get(message_id).copied()
    }

    fn last(&self) -> &ChatMessage {
        // Only called right after a push
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn complete_turn(store: &mut ConversationStore, question: &str, answer: &str) {
        store.append_user(question, None).unwrap();
        store.append_assistant(answer, None, None, None, MessageFlag::None);
    }

    #[test]
    fn test_new_conversation_is_seeded_with_welcome() {
        let store = ConversationStore::new("Welcome!");
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].content, "Welcome!");
        assert_eq!(store.messages()[0].flags, MessageFlag::System);
        assert!(store.history_window(2).is_empty());
    }

    #[test]
    fn test_second_user_turn_rejected_while_busy() {
        let mut store = ConversationStore::new("hi");
        store.append_user("first", None).unwrap();
        assert!(store.is_busy());

        let err = store.append_user("second", None).unwrap_err();
        assert!(matches!(err, DiscoveryError::Busy));
        assert_eq!(store.len(), 2);

        store.append_assistant("answer", None, None, None, MessageFlag::None);
        assert!(!store.is_busy());
        assert!(store.append_user("second", None).is_ok());
    }

    #[test]
    fn test_history_window_returns_last_two_oldest_first() {
        let mut store = ConversationStore::new("hi");
        complete_turn(&mut store, "q1", "a1");
        complete_turn(&mut store, "q2", "a2");
        complete_turn(&mut store, "q3", "a3");

        let window = store.history_window(2);
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q3", "a3"]);
    }

    #[test]
    fn test_history_window_skips_error_turns_and_pending_user_turn() {
        let mut store = ConversationStore::new("hi");
        complete_turn(&mut store, "q1", "a1");
        store.append_user("q2", None).unwrap();
        store.append_assistant("network down", None, None, None, MessageFlag::Error);
        store.append_user("q3", None).unwrap();

        let window = store.history_window(2);
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a1", "q2"]);
    }

    #[test]
    fn test_reset_reseeds_and_bumps_epoch() {
        let mut store = ConversationStore::new("hi");
        complete_turn(&mut store, "q1", "a1");
        store.append_user("q2", None).unwrap();
        let epoch = store.epoch();

        store.reset();

        assert_eq!(store.len(), 1);
        assert!(!store.is_busy());
        assert_eq!(store.epoch(), epoch + 1);
        assert_eq!(store.messages()[0].content, "hi");
    }

    #[test]
    fn test_feedback_only_on_assistant_turns() {
        let mut store = ConversationStore::new("hi");
        let user_id = store.append_user("q1", None).unwrap().id.clone();
        let assistant_id = store
            .append_assistant("a1", None, None, None, MessageFlag::None)
            .id
            .clone();

        store.record_feedback(&assistant_id, Feedback::Helpful).unwrap();
        assert_eq!(store.feedback(&assistant_id), Some(Feedback::Helpful));

        let err = store.record_feedback(&user_id, Feedback::Helpful).unwrap_err();
        assert!(matches!(err, DiscoveryError::MessageNotFound(_)));
    }
}
