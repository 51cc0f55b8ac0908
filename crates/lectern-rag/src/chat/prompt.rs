//! Prompt building for document question answering.

use super::history::ConversationTurn;
use crate::provider::ChatMessage;

/// System prompt text used when no chunk matched the question.
pub const NO_CONTEXT: &str = "No document context is available.";

/// Default number of prior turns placed in a request.
const DEFAULT_HISTORY_CAP: usize = 8;

/// Builder for the message list sent to the chat model.
///
/// The list is always: one system message carrying the instructions and the
/// document context, the most recent history turns, then the question.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    instructions: String,
    context: String,
    history: Vec<ConversationTurn>,
    history_cap: usize,
    question: String,
}

impl PromptBuilder {
    /// Creates a builder with the default instructions.
    pub fn new() -> Self {
        Self {
            instructions: default_instructions(),
            context: String::new(),
            history: Vec::new(),
            history_cap: DEFAULT_HISTORY_CAP,
            question: String::new(),
        }
    }

    /// Replaces the instructions preceding the context.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Sets the joined document context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Sets the prior conversation, oldest first.
    pub fn with_history(mut self, history: &[ConversationTurn]) -> Self {
        self.history = history.to_vec();
        self
    }

    /// Sets the maximum number of prior turns included.
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Sets the question being asked.
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    /// Builds the system prompt with context.
    pub fn build_system_prompt(&self) -> String {
        let context = if self.context.trim().is_empty() {
            NO_CONTEXT
        } else {
            self.context.as_str()
        };

        format!(
            "{}\n\n=== Document content (context) ===\n{context}",
            self.instructions
        )
    }

    /// Builds the complete message list for the API call.
    pub fn build_messages(&self) -> Vec<ChatMessage> {
        let skip = self.history.len().saturating_sub(self.history_cap);

        let mut messages = Vec::with_capacity(self.history.len() - skip + 2);
        messages.push(ChatMessage::system(self.build_system_prompt()));
        messages.extend(self.history[skip..].iter().map(ConversationTurn::to_message));
        messages.push(ChatMessage::user(&self.question));
        messages
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Default instructions for answering from a single document.
fn default_instructions() -> String {
    r#"You are a study assistant. Answer the student's questions using only the document below.

Rules:
- Reply in the language the user wrote in (Arabic or English).
- If the answer is not in the context, say so politely.
- Do not invent information that is not in the document.
- Be detailed and well organized."#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[test]
    fn system_prompt_carries_context() {
        let messages = PromptBuilder::new()
            .with_context("photosynthesis uses light")
            .with_question("what does photosynthesis use?")
            .build_messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.ends_with("photosynthesis uses light"));
        assert_eq!(messages[1], ChatMessage::user("what does photosynthesis use?"));
    }

    #[test]
    fn empty_context_uses_fallback() {
        let prompt = PromptBuilder::new().with_context("  ").build_system_prompt();
        assert!(prompt.ends_with(NO_CONTEXT));
    }

    #[test]
    fn history_is_capped_to_most_recent_turns() {
        let history: Vec<ConversationTurn> = (0..12)
            .map(|i| ConversationTurn::assistant(format!("turn {i}")))
            .collect();

        let messages = PromptBuilder::new()
            .with_history(&history)
            .with_question("next")
            .build_messages();

        assert_eq!(messages.len(), 1 + 8 + 1);
        assert_eq!(messages[1].content, "turn 4");
        assert_eq!(messages[8].content, "turn 11");
        assert_eq!(messages[9].content, "next");
    }
}
