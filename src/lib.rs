//! docquery - cached, retrying question answering over documents
//!
//! A caller uploads a document's extracted text, then asks natural-language
//! questions about it. Answers come from an external generation service
//! (Google Gemini by default), called through a [`ResilientInvoker`] that
//! retries transient transport failures with exponential backoff and
//! classifies every other failure. Answers are kept in a [`ResponseCache`]
//! for five minutes.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docquery::{
//!     CacheConfig, DocumentChat, DocumentStore, ExtractedText, GeminiClient, ResilientInvoker,
//!     ResponseCache, RetryPolicy,
//! };
//!
//! #[tokio::main]
//! async fn main() -> docquery::Result<()> {
//!     let documents = Arc::new(DocumentStore::new());
//!     let id = documents.ingest(
//!         "report.pdf",
//!         "application/pdf",
//!         ExtractedText::new("Revenue grew 12% in Q3.", 1),
//!     )?;
//!
//!     let chat = DocumentChat::new(
//!         documents,
//!         Arc::new(ResponseCache::new(&CacheConfig::default())),
//!         ResilientInvoker::new(Arc::new(GeminiClient::new("your-key")?), RetryPolicy::default()),
//!     );
//!
//!     println!("{}", chat.ask(id, "How much did revenue grow?").await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod invoker;
pub mod providers;
pub mod service;
pub mod telemetry;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResponseCache};
pub use config::{Config, Secrets};
pub use document::{Document, DocumentStore, ExtractedText, clean_text};
pub use error::{ClassifiedError, DocQueryError, Result, UpstreamError};
pub use invoker::{ResilientInvoker, build_prompt};
#[cfg(feature = "gemini")]
pub use providers::GeminiClient;
pub use providers::{GenerationProvider, RetryPolicy, with_retry};
pub use service::DocumentChat;
