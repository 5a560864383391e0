//! Clients for the remote sign-in and queue-registration service
//!
//! Both clients share one `reqwest::Client` built by [`ServiceClientBuilder`]. Their
//! calls never return [`crate::error::EnrollError`]: every failure is reduced to a
//! [`CallFailure`] so the batch runner can record it against the row and move on.

pub mod auth;
pub mod queue;

pub use auth::AuthClient;
pub use queue::QueueClient;

use crate::config::ServiceConfig;
use crate::error::{EnrollError, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a single sign-in or registration call did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallFailure {
    /// The endpoint answered with a status other than 200/202
    #[error("rejected with HTTP {status}")]
    Rejected { status: u16 },
    /// Accepted status but the body did not carry what was expected
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },
    /// Connection, TLS or body transfer failure
    #[error("transport error: {detail}")]
    Transport { detail: String },
    /// The configured per-call timeout elapsed
    #[error("timed out")]
    TimedOut,
}

impl CallFailure {
    pub(crate) fn from_request_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            CallFailure::TimedOut
        } else {
            CallFailure::Transport {
                detail: err.to_string(),
            }
        }
    }
}

/// Statuses both endpoints treat as success
pub(crate) fn is_accepted(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::OK || status == reqwest::StatusCode::ACCEPTED
}

pub struct ServiceClientBuilder {
    config: ServiceConfig,
    timeout: Option<Duration>,
}

impl ServiceClientBuilder {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            timeout: None,
        }
    }

    /// Per-call timeout; `None` leaves calls unbounded
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ServiceClient> {
        self.config.validate()?;

        let http = Client::builder()
            .danger_accept_invalid_certs(self.config.skip_tls)
            .build()
            .map_err(|e| EnrollError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let auth = AuthClient::new(
            http.clone(),
            self.config.sign_in_url()?,
            self.config.identifier_field.clone(),
            self.timeout,
        );
        let queue = QueueClient::new(http, self.config.register_url()?, self.timeout);

        Ok(ServiceClient { auth, queue })
    }
}

/// Pair of clients bound to one service configuration
#[derive(Debug, Clone)]
pub struct ServiceClient {
    auth: AuthClient,
    queue: QueueClient,
}

impl ServiceClient {
    pub fn builder(config: ServiceConfig) -> ServiceClientBuilder {
        ServiceClientBuilder::new(config)
    }

    pub fn auth_client(&self) -> AuthClient {
        self.auth.clone()
    }

    pub fn queue_client(&self) -> QueueClient {
        self.queue.clone()
    }

    pub fn into_parts(self) -> (AuthClient, QueueClient) {
        (self.auth, self.queue)
    }
}
