//! Resilient invocation of the generation provider.
//!
//! [`ResilientInvoker`] combines a document and a query into one prompt,
//! calls the provider under a [`RetryPolicy`], and turns whatever failure
//! ends the invocation into a single [`ClassifiedError`].
//!
//! Only transport timeouts and connection failures are retried. Every other
//! failure, including a rate-limit response, ends the invocation on first
//! occurrence.

use std::sync::Arc;

use tracing::{debug, error};

use crate::providers::{GenerationProvider, RetryPolicy, with_retry};
use crate::telemetry;
use crate::{ClassifiedError, UpstreamError};

/// Separator placed between the document text and the user query.
pub const PROMPT_DELIMITER: &str = "\n\nUser query: ";

/// Build the single combined prompt sent to the provider.
pub fn build_prompt(document_text: &str, query: &str) -> String {
    format!("{document_text}{PROMPT_DELIMITER}{query}")
}

/// Bounded-retry wrapper around a [`GenerationProvider`].
///
/// Holds no state across calls; each [`invoke()`](Self::invoke) is
/// independent and runs to completion.
pub struct ResilientInvoker {
    provider: Arc<dyn GenerationProvider>,
    policy: RetryPolicy,
}

impl ResilientInvoker {
    /// Wrap a provider with the given retry policy.
    pub fn new(provider: Arc<dyn GenerationProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Answer `query` about `document_text`.
    ///
    /// On success the text of the final attempt is returned untouched.
    pub async fn invoke(
        &self,
        document_text: &str,
        query: &str,
    ) -> Result<String, ClassifiedError> {
        let prompt = build_prompt(document_text, query);
        let provider = self.provider.name();
        debug!(provider, prompt_len = prompt.len(), "invoking generation provider");

        let outcome = with_retry(&self.policy, provider, UpstreamError::is_transient, || {
            self.provider.generate(&prompt)
        })
        .await;

        match outcome {
            Ok(text) => {
                metrics::counter!(telemetry::INVOCATIONS_TOTAL,
                    "provider" => provider.to_owned(),
                    "status" => "ok",
                )
                .increment(1);
                Ok(text)
            }
            Err(e) => {
                let classified = ClassifiedError::classify(&e);
                error!(
                    provider,
                    status = classified.status_code(),
                    error = %e,
                    "generation failed"
                );
                metrics::counter!(telemetry::INVOCATIONS_TOTAL,
                    "provider" => provider.to_owned(),
                    "status" => classified.status_code().to_string(),
                )
                .increment(1);
                Err(classified)
            }
        }
    }
}
