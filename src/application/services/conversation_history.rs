use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ports::ChatMessage;

pub const DEFAULT_MAX_TURNS: usize = 10;
pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
struct Turn {
    question: String,
    answer: String,
}

#[derive(Debug, Default)]
struct Conversation {
    turns: VecDeque<Turn>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Conversations {
    by_id: HashMap<String, Conversation>,
    clock: u64,
}

/// Recent question/answer turns per conversation id. Process-local only.
/// Once `max_conversations` ids are held, the least recently updated one is
/// dropped to make room.
pub struct ConversationHistory {
    conversations: RwLock<Conversations>,
    max_turns: usize,
    max_conversations: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationHistory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            conversations: RwLock::new(Conversations::default()),
            max_turns,
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
        }
    }

    pub fn with_max_conversations(mut self, max_conversations: usize) -> Self {
        self.max_conversations = max_conversations.max(1);
        self
    }

    /// Prior turns as alternating user/assistant messages, oldest first.
    pub async fn messages(&self, conversation_id: &str) -> Vec<ChatMessage> {
        let conversations = self.conversations.read().await;
        conversations
            .by_id
            .get(conversation_id)
            .map(|conversation| {
                conversation
                    .turns
                    .iter()
                    .flat_map(|turn| {
                        [
                            ChatMessage::user(turn.question.clone()),
                            ChatMessage::assistant(turn.answer.clone()),
                        ]
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn record(&self, conversation_id: &str, question: &str, answer: &str) {
        if self.max_turns == 0 {
            return;
        }

        let mut conversations = self.conversations.write().await;
        conversations.clock += 1;
        let now = conversations.clock;

        let conversation = conversations
            .by_id
            .entry(conversation_id.to_string())
            .or_default();
        conversation.last_used = now;
        conversation.turns.push_back(Turn {
            question: question.to_string(),
            answer: answer.to_string(),
        });
        while conversation.turns.len() > self.max_turns {
            conversation.turns.pop_front();
        }

        while conversations.by_id.len() > self.max_conversations {
            let Some(oldest) = conversations
                .by_id
                .iter()
                .min_by_key(|(_, c)| c.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            conversations.by_id.remove(&oldest);
            debug!("Dropped conversation {} from history", oldest);
        }
    }

    pub async fn turn_count(&self, conversation_id: &str) -> usize {
        self.conversations
            .read()
            .await
            .by_id
            .get(conversation_id)
            .map_or(0, |c| c.turns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ChatRole;

    #[tokio::test]
    async fn test_keeps_only_recent_turns() {
        let history = ConversationHistory::new(3);
        for i in 0..5 {
            history
                .record("c1", &format!("q{}", i), &format!("a{}", i))
                .await;
        }

        let messages = history.messages("c1").await;

        assert_eq!(history.turn_count("c1").await, 3);
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].content, "q2");
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[5].content, "a4");
        assert_eq!(messages[5].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_conversations_are_isolated() {
        let history = ConversationHistory::default();
        history.record("c1", "hello", "hi").await;

        assert!(history.messages("c2").await.is_empty());
        assert_eq!(history.turn_count("c1").await, 1);
    }

    #[tokio::test]
    async fn test_least_recently_updated_conversation_is_dropped() {
        let history = ConversationHistory::default().with_max_conversations(2);
        history.record("c1", "q", "a").await;
        history.record("c2", "q", "a").await;
        history.record("c1", "again", "a").await;

        history.record("c3", "q", "a").await;

        assert_eq!(history.turn_count("c1").await, 2);
        assert_eq!(history.turn_count("c2").await, 0);
        assert_eq!(history.turn_count("c3").await, 1);
    }
}
