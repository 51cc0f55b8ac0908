//! External collaborators: text extraction, OCR and chat models.
//!
//! Every collaborator is a trait object constructed by the caller and passed
//! in explicitly. Production implementations live next to the traits; mock
//! implementations live in [`crate::mock`].

mod chat;
mod extract;
mod ocr;
mod openrouter;
#[cfg(feature = "pdf")]
#[cfg_attr(docsrs, doc(cfg(feature = "pdf")))]
mod pdf;

pub use chat::{BoxedChatProvider, ChatMessage, ChatProvider, ChatRequest, Role};
pub use extract::{BoxedTextExtractor, ExtractedText, PlainTextExtractor, TextExtractor};
pub use ocr::{
    BoxedOcrProvider, DOCUMENT_OCR_PROMPT, OcrProvider, OcrRepairer, PageText, parse_page_reply,
    repair_prompt,
};
pub use openrouter::{
    OpenRouterClient, OpenRouterConfig, OpenRouterConfigBuilder, OpenRouterConfigBuilderError,
};
#[cfg(feature = "pdf")]
pub use pdf::PdfTextExtractor;
