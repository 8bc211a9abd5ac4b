//! Conversation history owned by the chat shell.

use serde::{Deserialize, Serialize};

/// First assistant message of every session.
pub const GREETING: &str = "Hello! Ask me to compare products, plan a trip, or anything else, \
and I'll provide a clear, structured response with references.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Append-only list of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    turns: Vec<ConversationTurn>,
}

impl ChatHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding only the assistant greeting.
    pub fn with_greeting() -> Self {
        let mut history = Self::new();
        history.push_assistant(GREETING);
        history
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Start over from the greeting.
    pub fn reset(&mut self) {
        *self = Self::with_greeting();
    }

    /// `role: content` lines, oldest first.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role.as_str(), t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_format() {
        let mut history = ChatHistory::new();
        history.push_user("Plan a trip to Rome");
        history.push_assistant("Day 1: Colosseum");

        assert_eq!(
            history.transcript(),
            "user: Plan a trip to Rome\nassistant: Day 1: Colosseum"
        );
    }

    #[test]
    fn test_empty_transcript() {
        assert_eq!(ChatHistory::new().transcript(), "");
    }

    #[test]
    fn test_greeting_and_reset() {
        let mut history = ChatHistory::with_greeting();
        assert_eq!(history.len(), 1);
        assert_eq!(history.turns()[0].role, Role::Assistant);

        history.push_user("hi");
        history.push_assistant("hello");
        assert_eq!(history.len(), 3);

        history.reset();
        assert_eq!(history, ChatHistory::with_greeting());
    }
}
