//! Authenticated REST client. Issues `POST` requests against the open
//! platform and unwraps the `{status, message, data}` envelope into a success
//! value or a classified failure.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::model::ApiEnvelope;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-bot REST client. Cheap to clone; the underlying connection pool is
/// shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api_base: String,
    client_id: String,
    token: String,
}

impl ApiClient {
    pub fn new(
        api_base: impl Into<String>,
        client_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_base: api_base.into(),
            client_id: client_id.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorization(&self) -> String {
        format!("Bot {}.{}", self.client_id, self.token)
    }

    /// Calls one endpoint with a JSON payload. No retries: retry policy, if
    /// any, belongs to the caller.
    pub async fn call<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Value> {
        debug!(client_id = %self.client_id, path = %path, "calling API");
        let response = self
            .client
            .post(self.url(path))
            .header(AUTHORIZATION, self.authorization())
            .json(payload)
            .send()
            .await
            .map_err(|e| AdapterError::Network(format!("API request error: {e}")))?;
        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|_| AdapterError::Network("API request error when parsing response".to_string()))?;
        unwrap_envelope(envelope)
    }

    /// Calls one endpoint with a multipart file body (resource uploads).
    pub async fn call_multipart(&self, path: &str, field: &str, bytes: Vec<u8>) -> Result<Value> {
        debug!(client_id = %self.client_id, path = %path, "calling API (multipart)");
        let form = reqwest::multipart::Form::new()
            .part(field.to_string(), reqwest::multipart::Part::bytes(bytes));
        let response = self
            .client
            .post(self.url(path))
            .header(AUTHORIZATION, self.authorization())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AdapterError::Network(format!("API request error: {e}")))?;
        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|_| AdapterError::Network("API request error when parsing response".to_string()))?;
        unwrap_envelope(envelope)
    }
}

fn unwrap_envelope(envelope: ApiEnvelope) -> Result<Value> {
    match envelope.status {
        0 => Ok(envelope.data),
        10005 => Err(AdapterError::Unauthorized {
            status: envelope.status,
            message: envelope.message,
        }),
        10082 | 10083 => Err(AdapterError::RateLimited {
            status: envelope.status,
            message: envelope.message,
        }),
        status => Err(AdapterError::ActionFailed {
            status,
            message: envelope.message,
        }),
    }
}
