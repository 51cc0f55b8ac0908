//! Question answering over a single document.

use lectern_core::{KeywordRetriever, ScoredChunk};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::ContextBuilder;
use super::history::{ChatHistoryStore, ConversationTurn};
use super::prompt::PromptBuilder;
use crate::document::{BoxedDocumentStore, DocumentStore};
use crate::provider::{BoxedChatProvider, ChatProvider, ChatRequest};
use crate::{Error, RagConfig, Result, TRACING_TARGET_CHAT};

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// The model's reply.
    pub answer: String,
    /// Chunks placed in the context, highest score first.
    pub relevant_chunks: Vec<ScoredChunk>,
    /// The document's full history, including this exchange.
    pub history: Vec<ConversationTurn>,
}

/// Answers questions about stored documents.
///
/// Each question retrieves the best-matching chunks of one document, sends
/// them with the recent conversation to the chat model and records the
/// exchange in that document's history.
#[derive(Clone)]
pub struct QaService {
    documents: BoxedDocumentStore,
    chat: BoxedChatProvider,
    histories: ChatHistoryStore,
    retriever: KeywordRetriever,
    context: ContextBuilder,
    config: RagConfig,
}

impl QaService {
    /// Creates a service with an empty history store.
    pub fn new(documents: BoxedDocumentStore, chat: BoxedChatProvider, config: RagConfig) -> Self {
        Self {
            documents,
            chat,
            histories: ChatHistoryStore::new(),
            retriever: KeywordRetriever::new(config.retrieval_limit),
            context: ContextBuilder::new().with_char_budget(config.context_char_budget),
            config,
        }
    }

    /// Uses an existing history store.
    pub fn with_histories(mut self, histories: ChatHistoryStore) -> Self {
        self.histories = histories;
        self
    }

    /// Answers `message` about the document `document_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank message,
    /// [`Error::DocumentNotFound`] for an unknown document and
    /// [`Error::Provider`] if the model fails. History is only updated when
    /// an answer was produced.
    #[tracing::instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn ask(&self, document_id: Uuid, message: &str) -> Result<Answer> {
        if message.trim().is_empty() {
            return Err(Error::invalid_input("message must not be empty"));
        }

        let chunks = self.documents.chunks(document_id).await?;
        let scored = self.retriever.find_relevant(&chunks, message);
        let used = self.context.select(&scored).to_vec();
        let context = self.context.build(&used);

        tracing::debug!(
            target: TRACING_TARGET_CHAT,
            document_id = %document_id,
            chunks = chunks.len(),
            relevant = used.len(),
            context_chars = context.len(),
            "Retrieved context"
        );

        let recent = self
            .histories
            .recent(document_id, self.config.history_window)
            .await;

        let messages = PromptBuilder::new()
            .with_context(context)
            .with_history(&recent)
            .with_history_cap(self.config.prompt_history_cap)
            .with_question(message)
            .build_messages();

        let request = ChatRequest::new(messages)
            .with_max_tokens(self.config.answer_max_tokens)
            .with_temperature(self.config.answer_temperature);

        let answer = self.chat.complete(&request).await.inspect_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET_CHAT,
                document_id = %document_id,
                provider = self.chat.name(),
                retryable = error.is_retryable(),
                error = %error,
                "Chat model failed"
            );
        })?;

        let previews = used
            .iter()
            .map(|chunk| chunk.preview(self.config.preview_chars))
            .collect();
        let history = self
            .histories
            .append(
                document_id,
                [
                    ConversationTurn::user(message, previews),
                    ConversationTurn::assistant(&answer),
                ],
            )
            .await;

        Ok(Answer {
            answer,
            relevant_chunks: used,
            history: history.turns().to_vec(),
        })
    }

    /// Returns the document's conversation history, oldest first.
    pub async fn history(&self, document_id: Uuid) -> Vec<ConversationTurn> {
        self.histories.get(document_id).await.turns().to_vec()
    }

    /// Deletes the document's conversation history.
    pub async fn clear_history(&self, document_id: Uuid) -> bool {
        let cleared = self.histories.clear(document_id).await;
        tracing::debug!(
            target: TRACING_TARGET_CHAT,
            document_id = %document_id,
            cleared,
            "Cleared chat history"
        );
        cleared
    }
}

impl std::fmt::Debug for QaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaService")
            .field("chat", &self.chat.name())
            .field("retriever", &self.retriever)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lectern_core::chunk_text;

    use super::*;
    use crate::document::{Document, InMemoryDocumentStore};
    use crate::mock::MockChatProvider;
    use crate::provider::Role;

    const TEXT: &str = "Photosynthesis happens in the chloroplast.\n\
                        Mitochondria produce energy for the cell.\n\
                        The chloroplast contains chlorophyll which absorbs light.";

    async fn service(chat: Arc<MockChatProvider>) -> (QaService, Uuid) {
        service_with(chat, RagConfig::default()).await
    }

    async fn service_with(chat: Arc<MockChatProvider>, config: RagConfig) -> (QaService, Uuid) {
        let store = InMemoryDocumentStore::new();
        let mut document = Document::new("Biology", "/tmp/biology.pdf");
        document.chunks = chunk_text(TEXT, 8, 0);
        let id = document.id;
        store.insert(document).await.unwrap();

        (QaService::new(Arc::new(store), chat, config), id)
    }

    #[tokio::test]
    async fn answers_with_ranked_context_and_records_history() {
        let chat = Arc::new(MockChatProvider::new("In the chloroplast."));
        let (service, id) = service(chat.clone()).await;

        let answer = service.ask(id, "where is the chloroplast").await.unwrap();

        assert_eq!(answer.answer, "In the chloroplast.");
        assert_eq!(answer.history.len(), 2);
        assert_eq!(answer.history[0].role, Role::User);
        assert_eq!(answer.history[1].role, Role::Assistant);
        assert!(!answer.relevant_chunks.is_empty());
        assert!(answer.history[0].relevant_chunks[0].ends_with("..."));

        let request = chat.last_request().unwrap();
        assert_eq!(request.max_tokens, Some(1500));
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[0].content.contains("chloroplast"));
        assert!(request.messages[0].content.contains("\n\n---\n\n"));
    }

    #[tokio::test]
    async fn context_budget_limits_used_chunks() {
        let question = "chloroplast chlorophyll";

        let chat = Arc::new(MockChatProvider::new("ok"));
        let (unbounded, id) = service(chat).await;
        let answer = unbounded.ask(id, question).await.unwrap();
        assert_eq!(answer.relevant_chunks.len(), 2);

        let chat = Arc::new(MockChatProvider::new("ok"));
        let config = RagConfig {
            context_char_budget: Some(60),
            ..RagConfig::default()
        };
        let (bounded, id) = service_with(chat.clone(), config).await;
        let answer = bounded.ask(id, question).await.unwrap();

        assert_eq!(answer.relevant_chunks.len(), 1);
        assert_eq!(answer.relevant_chunks[0].relevance_score, 2);
        assert_eq!(answer.history[0].relevant_chunks.len(), 1);

        let system = &chat.last_request().unwrap().messages[0].content;
        assert!(system.contains("chlorophyll"));
        assert!(!system.contains("Photosynthesis"));
        assert!(!system.contains(crate::chat::CONTEXT_SEPARATOR));
    }

    #[tokio::test]
    async fn unmatched_questions_use_the_fallback_context() {
        let chat = Arc::new(MockChatProvider::new("Not in the document."));
        let (service, id) = service(chat.clone()).await;

        let answer = service.ask(id, "quantum gravity").await.unwrap();

        assert!(answer.relevant_chunks.is_empty());
        let system = &chat.last_request().unwrap().messages[0].content;
        assert!(system.ends_with(crate::chat::NO_CONTEXT));
    }

    #[tokio::test]
    async fn later_questions_carry_recent_history() {
        let chat = Arc::new(MockChatProvider::new("ok"));
        let (service, id) = service(chat.clone()).await;

        for i in 0..5 {
            service.ask(id, &format!("question {i}")).await.unwrap();
        }

        // Six stored turns of the last three exchanges, plus system and question.
        let request = chat.last_request().unwrap();
        assert_eq!(request.messages.len(), 1 + 6 + 1);
        assert_eq!(request.messages[1].content, "question 1");
        assert_eq!(service.history(id).await.len(), 10);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let chat = Arc::new(MockChatProvider::new("unused"));
        let (service, id) = service(chat.clone()).await;

        let error = service.ask(id, "   ").await.unwrap_err();

        assert!(matches!(error, Error::InvalidInput(_)));
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_documents_are_not_found() {
        let chat = Arc::new(MockChatProvider::new("unused"));
        let (service, _) = service(chat).await;

        let error = service.ask(Uuid::now_v7(), "cell").await.unwrap_err();
        assert!(matches!(error, Error::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn model_failure_leaves_history_untouched() {
        let chat = Arc::new(MockChatProvider::failing("HTTP 503"));
        let (service, id) = service(chat).await;

        let error = service.ask(id, "cell").await.unwrap_err();

        assert!(error.to_string().starts_with("model unavailable"));
        assert!(service.history(id).await.is_empty());
    }

    #[tokio::test]
    async fn clear_history_removes_turns() {
        let chat = Arc::new(MockChatProvider::new("ok"));
        let (service, id) = service(chat).await;
        service.ask(id, "cell").await.unwrap();

        assert!(service.clear_history(id).await);
        assert!(service.history(id).await.is_empty());
    }
}
