//! Per-document conversation history.

use std::collections::HashMap;
use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::provider::{ChatMessage, Role};

/// One stored message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: Timestamp,
    /// Previews of the chunks used to answer, on user turns only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relevant_chunks: Vec<String>,
}

impl ConversationTurn {
    /// Creates a user turn with the previews of the chunks it was answered from.
    pub fn user(content: impl Into<String>, relevant_chunks: Vec<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Timestamp::now(),
            relevant_chunks,
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Timestamp::now(),
            relevant_chunks: Vec::new(),
        }
    }

    /// Converts the turn into a model message.
    ///
    /// Anything that is not an assistant turn is sent as a user message.
    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            Role::Assistant => ChatMessage::assistant(&self.content),
            Role::User | Role::System => ChatMessage::user(&self.content),
        }
    }
}

/// Conversation history of a single document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    turns: Vec<ConversationTurn>,
}

impl ChatHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn.
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Returns all turns, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Returns at most the last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if no turns are stored.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// In-memory store of chat histories keyed by document id, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ChatHistoryStore {
    histories: Arc<RwLock<HashMap<Uuid, ChatHistory>>>,
}

impl ChatHistoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the document's history, empty if none exists.
    pub async fn get(&self, document_id: Uuid) -> ChatHistory {
        self.histories
            .read()
            .await
            .get(&document_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns at most the last `n` turns of the document's history.
    pub async fn recent(&self, document_id: Uuid, n: usize) -> Vec<ConversationTurn> {
        self.histories
            .read()
            .await
            .get(&document_id)
            .map(|history| history.recent(n).to_vec())
            .unwrap_or_default()
    }

    /// Appends turns to the document's history, creating it if needed, and
    /// returns the updated history.
    ///
    /// All turns are appended under one lock, so concurrent exchanges on the
    /// same document never interleave.
    pub async fn append(
        &self,
        document_id: Uuid,
        turns: impl IntoIterator<Item = ConversationTurn>,
    ) -> ChatHistory {
        let mut histories = self.histories.write().await;
        let history = histories.entry(document_id).or_default();
        for turn in turns {
            history.push(turn);
        }
        history.clone()
    }

    /// Removes the document's history. Returns true if one existed.
    pub async fn clear(&self, document_id: Uuid) -> bool {
        self.histories.write().await.remove(&document_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_keeps_the_tail_in_order() {
        let mut history = ChatHistory::new();
        for i in 0..10 {
            history.push(ConversationTurn::assistant(format!("turn {i}")));
        }

        let recent: Vec<&str> = history.recent(3).iter().map(|t| t.content.as_str()).collect();
        assert_eq!(recent, vec!["turn 7", "turn 8", "turn 9"]);
        assert_eq!(history.recent(50).len(), 10);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn turns_map_to_model_roles() {
        assert_eq!(
            ConversationTurn::user("q", vec![]).to_message(),
            ChatMessage::user("q")
        );
        assert_eq!(
            ConversationTurn::assistant("a").to_message(),
            ChatMessage::assistant("a")
        );
    }

    #[test]
    fn user_turns_serialize_chunk_previews() {
        let turn = ConversationTurn::user("q", vec!["chunk...".into()]);
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["relevantChunks"][0], "chunk...");

        let json = serde_json::to_value(ConversationTurn::assistant("a")).unwrap();
        assert!(json.get("relevantChunks").is_none());
    }

    #[tokio::test]
    async fn store_creates_appends_and_clears() {
        let store = ChatHistoryStore::new();
        let id = Uuid::now_v7();
        assert!(store.get(id).await.is_empty());

        let history = store
            .append(
                id,
                [ConversationTurn::user("q", vec![]), ConversationTurn::assistant("a")],
            )
            .await;
        assert_eq!(history.len(), 2);
        assert_eq!(store.recent(id, 1).await[0].content, "a");

        assert!(store.clear(id).await);
        assert!(!store.clear(id).await);
        assert!(store.get(id).await.is_empty());
    }
}
