use std::{sync::Arc, time::Duration};

use chat_core::config::{Config, ProxyAuth};
use reqwest::{Client, Proxy, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{LoginRequest, LoginResponse, RawResponse, RefreshRequest, RefreshResponse};
use crate::error::BackendError;

fn apply_proxy_auth(proxy: Proxy, auth: Option<&ProxyAuth>) -> Proxy {
    let Some(auth) = auth else {
        return proxy;
    };
    if auth.username.is_empty() {
        return proxy;
    }
    proxy.basic_auth(&auth.username, &auth.password)
}

/// Thin client over the backend endpoints the frontend consumes.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Arc<ClientWithMiddleware>,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let client = Self::build_http_client(config)?;
        let client = if config.max_retries > 0 {
            Self::build_retry_client(client, config.max_retries)
        } else {
            ClientBuilder::new(client).build()
        };
        Ok(Self::with_client(Arc::new(client), &config.backend_url))
    }

    pub fn with_client(client: Arc<ClientWithMiddleware>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_http_client(config: &Config) -> Result<Client, BackendError> {
        let mut builder =
            Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));
        if config.http_proxy.is_empty() && config.https_proxy.is_empty() {
            builder = builder.no_proxy();
        }
        if !config.http_proxy.is_empty() {
            let proxy = Proxy::http(&config.http_proxy)
                .map_err(|e| BackendError::Client(e.to_string()))?;
            builder = builder.proxy(apply_proxy_auth(proxy, config.http_proxy_auth.as_ref()));
        }
        if !config.https_proxy.is_empty() {
            let proxy = Proxy::https(&config.https_proxy)
                .map_err(|e| BackendError::Client(e.to_string()))?;
            builder = builder.proxy(apply_proxy_auth(proxy, config.https_proxy_auth.as_ref()));
        }
        builder
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))
    }

    fn build_retry_client(client: Client, max_retries: u32) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(5))
            .build_with_max_retries(max_retries);

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// `POST /login`
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint("/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `POST /refresh`
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint("/refresh"))
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `POST /signout`, invalidating the refresh token server side.
    pub async fn sign_out(&self, refresh_token: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("/signout"))
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    /// `GET /response?conversation_id=<id>`.
    ///
    /// Non-2xx statuses are not errors here: callers decide what to do with
    /// the body.
    pub async fn fetch_responses(
        &self,
        conversation_id: &str,
        access_token: &str,
    ) -> Result<RawResponse, BackendError> {
        let response = self
            .client
            .get(self.endpoint("/response"))
            .query(&[("conversation_id", conversation_id)])
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("GET /response for {conversation_id}: {status}");
        Ok(RawResponse { status, body })
    }

    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status { status, body })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
