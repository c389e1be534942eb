//! Shared HTTP client for the Ridebook API.
//!
//! Provides a minimal client with configurable auth (Bearer token or X-API-Key),
//! generic GET/POST/PATCH/DELETE helpers, and the [`DriverBackend`] implementation
//! used by the driver workflow services and the CLI.

pub mod backend;
pub mod drivers;

use reqwest::{Client, RequestBuilder, Response};
use ridebook_core::config::Auth;
use ridebook_core::{extract_error_message, AppError, ClientConfig, ErrorSource};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use backend::DriverBackend;
pub use drivers::UploadTicketResponse;

/// HTTP client for the Ridebook API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        api_prefix: String,
        auth: Auth,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix,
            auth,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        Self::new(
            config.api_url.clone(),
            config.api_prefix(),
            config.auth.clone(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path relative to the version prefix (e.g. `/drivers`).
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    /// Send the request and turn transport failures and non-2xx statuses into `AppError`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = match self.apply_auth(request).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, timeout = e.is_timeout(), "API request failed to send");
                return Err(extract_error_message(ErrorSource::Backend, None, "").into());
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let extracted = extract_error_message(ErrorSource::Backend, Some(status.as_u16()), &body);
        tracing::debug!(
            status = status.as_u16(),
            kind = %extracted.kind,
            "API request failed"
        );
        Err(extracted.into())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse response as JSON: {}", e)))
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        Self::decode(self.execute(request).await?).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let request = self.client.post(self.build_url(path)).json(body);
        Self::decode(self.execute(request).await?).await
    }

    /// PATCH JSON body and deserialize response.
    pub async fn patch_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let request = self.client.patch(self.build_url(path)).json(body);
        Self::decode(self.execute(request).await?).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        self.execute(self.client.delete(self.build_url(path)))
            .await
            .map(|_| ())
    }
}
