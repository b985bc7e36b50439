use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("http error: {0}")]
    Http(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("no answer returned from model")]
    EmptyResponse,
    #[error("model backend not configured: {0}")]
    NotConfigured(String),
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
    #[error("admission gate closed")]
    GateClosed,
}

/// Capability to turn a prompt into a raw text answer.
///
/// `None` for model or temperature means the backend's configured default.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn call(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, ModelError>;
}

#[async_trait]
impl<T: ModelClient + ?Sized> ModelClient for Arc<T> {
    async fn call(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, ModelError> {
        (**self).call(prompt, model, temperature).await
    }
}
