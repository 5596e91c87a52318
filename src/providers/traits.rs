//! Provider trait for the external text-generation capability.
//!
//! The resilient invoker talks to the outside world only through
//! [`GenerationProvider`], so tests can drive it with scripted mocks and
//! deployments can swap the backing service.
//!
//! # Example
//!
//! ```ignore
//! struct Echo;
//!
//! #[async_trait]
//! impl GenerationProvider for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
//!         Ok(prompt.to_string())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::UpstreamError;

/// Provider for single-prompt text generation.
///
/// Implementations report failures as raw [`UpstreamError`]s; retrying and
/// classification happen in the caller.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Generate a text completion for one combined prompt.
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}
