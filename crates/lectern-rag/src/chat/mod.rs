//! Question answering: context assembly, prompts and conversation history.

mod context;
mod history;
mod prompt;
mod service;

pub use context::{CONTEXT_SEPARATOR, ContextBuilder};
pub use history::{ChatHistory, ChatHistoryStore, ConversationTurn};
pub use prompt::{NO_CONTEXT, PromptBuilder};
pub use service::{Answer, QaService};
