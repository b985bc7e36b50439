pub mod api;
pub mod chat;
pub mod gate;
pub mod local;
pub mod traits;

use async_trait::async_trait;

pub use api::ApiClient;
pub use chat::parse_chat_completion;
pub use gate::{AdmissionGate, AdmissionPermit};
pub use local::LocalClient;
pub use traits::{ModelClient, ModelError};

use crate::config::{BackendKind, Config};

/// The two model backends behind one capability
#[derive(Debug, Clone)]
pub enum ModelBackend {
    Api(ApiClient),
    Local(LocalClient),
}

impl ModelBackend {
    pub fn from_config(
        config: &Config,
        kind: BackendKind,
        gate: AdmissionGate,
    ) -> Result<Self, ModelError> {
        Ok(match kind {
            BackendKind::Api => ModelBackend::Api(ApiClient::new(config, gate)?),
            BackendKind::Local => ModelBackend::Local(LocalClient::new(config, gate)?),
        })
    }
}

#[async_trait]
impl ModelClient for ModelBackend {
    async fn call(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, ModelError> {
        match self {
            ModelBackend::Api(client) => client.call(prompt, model, temperature).await,
            ModelBackend::Local(client) => client.call(prompt, model, temperature).await,
        }
    }
}
