//! Consumed interface to the document-generation executor
//!
//! Turning a finished outline into prose is a long-running, potentially
//! suspending operation that lives outside this engine. The only contract
//! is: accepts a finished outline, eventually returns generated text or
//! fails. Failures are propagated untouched.

use std::fmt;

use async_trait::async_trait;

use crate::outline::Outline;

/// Failure reported by a generation executor
#[derive(Debug, Clone)]
pub struct GenerateError {
    pub message: String,
}

impl GenerateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation failed: {}", self.message)
    }
}

impl std::error::Error for GenerateError {}

/// The opaque async document generator this engine hands finished outlines to
#[async_trait]
pub trait GenerationExecutor: Send + Sync {
    async fn generate(&self, outline: &Outline) -> Result<String, GenerateError>;
}
