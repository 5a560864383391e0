//! Sign-in client

use crate::common::traits::Authenticator;
use crate::service::{CallFailure, is_accepted};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct SignInResponse {
    token: Option<TokenEnvelope>,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: Option<String>,
}

/// Calls the sign-in endpoint and extracts the bearer token at `token.token`
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    url: Url,
    identifier_field: String,
    timeout: Option<Duration>,
}

impl AuthClient {
    pub fn new(http: Client, url: Url, identifier_field: String, timeout: Option<Duration>) -> Self {
        Self {
            http,
            url,
            identifier_field,
            timeout,
        }
    }

    fn credentials_body(&self, login: &str, password: &str) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert(self.identifier_field.clone(), Value::String(login.to_string()));
        body.insert("password".to_string(), Value::String(password.to_string()));
        body
    }
}

#[async_trait]
impl Authenticator for AuthClient {
    async fn authenticate(&self, login: &str, password: &str) -> Result<String, CallFailure> {
        tracing::debug!(login, url = %self.url, "requesting token");

        let mut request = self
            .http
            .post(self.url.clone())
            .json(&self.credentials_body(login, password));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(login, error = %e, "sign-in request failed");
            CallFailure::from_request_error(&e)
        })?;

        let status = response.status();
        if !is_accepted(status) {
            tracing::debug!(login, status = status.as_u16(), "sign-in rejected");
            return Err(CallFailure::Rejected {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(login, error = %e, "sign-in response body could not be read");
            CallFailure::from_request_error(&e)
        })?;
        let body: SignInResponse =
            serde_json::from_slice(&bytes).map_err(|e| CallFailure::MalformedResponse {
                detail: e.to_string(),
            })?;

        match body.token.and_then(|t| t.token).filter(|t| !t.is_empty()) {
            Some(token) => {
                tracing::debug!(login, token_len = token.len(), "token obtained");
                Ok(token)
            }
            None => Err(CallFailure::MalformedResponse {
                detail: "response has no token.token value".to_string(),
            }),
        }
    }
}
