//! Queue registration client

use crate::common::traits::QueueRegistrar;
use crate::service::{CallFailure, is_accepted};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use url::Url;

/// Calls the registration endpoint with the child, class and course as query parameters
#[derive(Debug, Clone)]
pub struct QueueClient {
    http: Client,
    url: Url,
    timeout: Option<Duration>,
}

impl QueueClient {
    pub fn new(http: Client, url: Url, timeout: Option<Duration>) -> Self {
        Self { http, url, timeout }
    }

    pub fn request_url(&self, child_id: &str, class_id: &str, course_id: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("childId", child_id)
            .append_pair("classId", class_id)
            .append_pair("courseId", course_id);
        url
    }
}

#[async_trait]
impl QueueRegistrar for QueueClient {
    async fn register(
        &self,
        token: &str,
        child_id: &str,
        class_id: &str,
        course_id: &str,
    ) -> Result<(), CallFailure> {
        let url = self.request_url(child_id, class_id, course_id);
        tracing::debug!(child_id, class_id, course_id, "registering in queue");

        let mut request = self
            .http
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(child_id, error = %e, "registration request failed");
            CallFailure::from_request_error(&e)
        })?;

        let status = response.status();
        if is_accepted(status) {
            Ok(())
        } else {
            tracing::debug!(child_id, status = status.as_u16(), "registration rejected");
            Err(CallFailure::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_become_query_parameters() {
        let client = QueueClient::new(
            Client::new(),
            Url::parse("https://example.com/v1/LinePosition/UpdateQueueV2").unwrap(),
            None,
        );
        let url = client.request_url("12345", "7", "42");
        assert_eq!(
            url.as_str(),
            "https://example.com/v1/LinePosition/UpdateQueueV2?childId=12345&classId=7&courseId=42"
        );
    }
}
