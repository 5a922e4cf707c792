use log::{debug, warn};

use crate::api::ApiError;

/// Reply appended when the chat backend cannot be reached. Chat failures
/// degrade to conversation, never an error banner.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble answering right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A chat request handed to the network layer, tied to the transcript
/// generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSend {
    pub generation: u64,
    pub message: String,
}

/// Owns the conversation transcript, the draft buffer, and the typing flag.
///
/// The transcript is append-only and display-ordered; it only ever shrinks
/// through `clear`, which advances a generation counter so a reply still in
/// flight cannot repopulate the emptied history.
#[derive(Debug, Default)]
pub struct ChatController {
    pub history: Vec<ChatMessage>,
    pub draft: String,
    pub is_typing: bool,
    generation: u64,
}

impl ChatController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_draft(&mut self, text: String) {
        self.draft = text;
    }

    /// Submits the current draft. Blank drafts and submissions while a reply
    /// is already pending are no-ops. The user turn is appended and the draft
    /// cleared before the request goes out.
    pub fn submit(&mut self) -> Option<ChatSend> {
        let message = self.draft.trim().to_string();
        if message.is_empty() || self.is_typing {
            return None;
        }
        self.history.push(ChatMessage {
            role: Role::User,
            content: message.clone(),
        });
        self.draft.clear();
        self.is_typing = true;
        Some(ChatSend {
            generation: self.generation,
            message,
        })
    }

    /// Applies a resolved chat request. A reply issued before the last clear
    /// is discarded; a failure appends the fixed fallback line instead.
    pub fn apply_reply(&mut self, generation: u64, result: Result<String, ApiError>) {
        if generation != self.generation {
            debug!("dropping chat reply from a cleared conversation");
            return;
        }
        self.is_typing = false;
        let content = match result {
            Ok(reply) => reply,
            Err(err) => {
                warn!("chat request failed: {err}");
                FALLBACK_REPLY.to_string()
            }
        };
        self.history.push(ChatMessage {
            role: Role::Assistant,
            content,
        });
    }

    /// Empties the transcript unconditionally and invalidates any reply still
    /// in flight.
    pub fn clear(&mut self) {
        self.history.clear();
        self.is_typing = false;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_submissions_are_no_ops() {
        let mut chat = ChatController::new();
        chat.set_draft(String::new());
        assert!(chat.submit().is_none());
        chat.set_draft("   ".to_string());
        assert!(chat.submit().is_none());
        assert!(chat.history.is_empty());
        assert!(!chat.is_typing);
    }

    #[test]
    fn submit_appends_user_turn_and_clears_draft() {
        let mut chat = ChatController::new();
        chat.set_draft("  will it rain tomorrow?  ".to_string());
        let send = chat.submit().expect("send");

        assert_eq!(send.message, "will it rain tomorrow?");
        assert_eq!(chat.history.len(), 1);
        assert_eq!(chat.history[0].role, Role::User);
        assert_eq!(chat.history[0].content, "will it rain tomorrow?");
        assert!(chat.draft.is_empty());
        assert!(chat.is_typing);
    }

    #[test]
    fn resubmit_while_typing_is_gated() {
        let mut chat = ChatController::new();
        chat.set_draft("first".to_string());
        let send = chat.submit().expect("send");

        chat.set_draft("second".to_string());
        assert!(chat.submit().is_none());
        assert_eq!(chat.history.len(), 1);

        chat.apply_reply(send.generation, Ok("Probably not.".to_string()));
        assert!(chat.submit().is_some());
    }

    #[test]
    fn reply_appends_assistant_turn_in_order() {
        let mut chat = ChatController::new();
        chat.set_draft("hello".to_string());
        let send = chat.submit().unwrap();
        chat.apply_reply(send.generation, Ok("Hi! Ask me about the weather.".to_string()));

        assert_eq!(chat.history.len(), 2);
        assert_eq!(chat.history[1].role, Role::Assistant);
        assert_eq!(chat.history[1].content, "Hi! Ask me about the weather.");
        assert!(!chat.is_typing);
    }

    #[test]
    fn failure_degrades_to_fallback_reply() {
        let mut chat = ChatController::new();
        chat.set_draft("hello".to_string());
        let send = chat.submit().unwrap();
        chat.apply_reply(
            send.generation,
            Err(ApiError::Transport("connection refused".to_string())),
        );

        assert_eq!(chat.history.len(), 2);
        assert_eq!(chat.history[1].role, Role::Assistant);
        assert_eq!(chat.history[1].content, FALLBACK_REPLY);
        assert!(!chat.is_typing);
    }

    #[test]
    fn clear_empties_history_and_typing_flag() {
        let mut chat = ChatController::new();
        chat.set_draft("hello".to_string());
        chat.submit().unwrap();
        chat.clear();

        assert!(chat.history.is_empty());
        assert!(!chat.is_typing);
    }

    #[test]
    fn reply_from_before_clear_is_discarded() {
        let mut chat = ChatController::new();
        chat.set_draft("hello".to_string());
        let send = chat.submit().unwrap();
        chat.clear();

        chat.apply_reply(send.generation, Ok("too late".to_string()));
        assert!(chat.history.is_empty());
        assert!(!chat.is_typing);
    }
}
