//! Generation providers and the retry machinery around them.
//!
//! - [`traits`]: the [`GenerationProvider`] seam
//! - [`retry`]: [`RetryPolicy`] and the shared [`with_retry()`] helper
//! - `gemini`: the Google Gemini client (feature `gemini`)

#[cfg(feature = "gemini")]
pub mod gemini;
pub mod retry;
pub mod traits;

#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
pub use retry::{RetryPolicy, with_retry};
pub use traits::GenerationProvider;
