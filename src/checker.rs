//! Availability checking against the Discord invite endpoint.
//!
//! The scheduler only ever sees the tri-state [`Availability`] result. The
//! contract is deliberately conservative: the sole signal that maps to
//! [`Availability::Available`] is a definitive not-found response (HTTP 404
//! with the Unknown Invite error code). Every other status, and every
//! transport failure, maps to [`Availability::Unknown`], which the scheduler
//! treats as "assume still taken, try again next tick". This prevents
//! spurious notifications from transient errors, at the cost of never
//! distinguishing "confirmed taken" from "could not tell".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::VanityCode;

/// Discord JSON error code for an unknown (free) invite.
const UNKNOWN_INVITE_CODE: u32 = 10_006;

/// Result of a single availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The code resolves to an existing invite.
    Taken,
    /// The remote service definitively reported the code as free.
    Available,
    /// Transport failure or a non-definitive response. Assume still taken.
    Unknown,
}

/// Collaborator interface wrapping the remote existence check.
#[async_trait]
pub trait VanityChecker: Send + Sync {
    /// Checks whether `code` currently resolves to an invite.
    async fn check(&self, code: &VanityCode) -> Availability;
}

/// Checker backed by the Discord invite API.
#[derive(Debug, Clone)]
pub struct InviteChecker {
    client: Client,
    api_base: String,
}

/// Minimal shape of a Discord API error body.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: u32,
}

impl InviteChecker {
    /// Creates a checker against `api_base` with a per-call timeout.
    #[must_use]
    pub fn new(api_base: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, api_base }
    }
}

#[async_trait]
impl VanityChecker for InviteChecker {
    async fn check(&self, code: &VanityCode) -> Availability {
        let url = format!("{}/invites/{}", self.api_base, code);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(code = %code, error = %err, "Invite check failed, treating as unknown");
                return Availability::Unknown;
            }
        };

        let status = response.status();
        match status {
            _ if status.is_success() => {
                debug!(code = %code, "Invite exists, still taken");
                Availability::Taken
            }
            StatusCode::NOT_FOUND => {
                // Only the Unknown Invite error code is a definitive free
                // signal; any other 404 body is inconclusive.
                match response.json::<ApiError>().await {
                    Ok(body) if body.code == UNKNOWN_INVITE_CODE => {
                        debug!(code = %code, "Invite not found, now available");
                        Availability::Available
                    }
                    Ok(body) => {
                        warn!(
                            code = %code,
                            api_code = body.code,
                            "Unexpected 404 error code, treating as unknown"
                        );
                        Availability::Unknown
                    }
                    Err(err) => {
                        warn!(code = %code, error = %err, "Unparseable 404 body, treating as unknown");
                        Availability::Unknown
                    }
                }
            }
            _ => {
                warn!(
                    code = %code,
                    status = status.as_u16(),
                    "Unexpected status from invite check, treating as unknown"
                );
                Availability::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

    fn code(raw: &str) -> VanityCode {
        VanityCode::parse(raw).unwrap()
    }

    fn checker_for(server: &MockServer) -> InviteChecker {
        InviteChecker::new(server.uri(), CHECK_TIMEOUT)
    }

    #[tokio::test]
    async fn test_existing_invite_is_taken() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invites/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "demo",
                "guild": {"id": "123"}
            })))
            .mount(&server)
            .await;

        let checker = checker_for(&server);
        assert_eq!(checker.check(&code("demo")).await, Availability::Taken);
    }

    #[tokio::test]
    async fn test_unknown_invite_404_is_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invites/demo"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Unknown Invite",
                "code": 10006
            })))
            .mount(&server)
            .await;

        let checker = checker_for(&server);
        assert_eq!(checker.check(&code("demo")).await, Availability::Available);
    }

    #[tokio::test]
    async fn test_404_with_other_error_code_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invites/demo"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Unknown Endpoint",
                "code": 0
            })))
            .mount(&server)
            .await;

        let checker = checker_for(&server);
        assert_eq!(checker.check(&code("demo")).await, Availability::Unknown);
    }

    #[tokio::test]
    async fn test_server_error_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invites/demo"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let checker = checker_for(&server);
        assert_eq!(checker.check(&code("demo")).await, Availability::Unknown);
    }

    #[tokio::test]
    async fn test_rate_limit_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invites/demo"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let checker = checker_for(&server);
        assert_eq!(checker.check(&code("demo")).await, Availability::Unknown);
    }

    #[tokio::test]
    async fn test_connection_error_is_unknown() {
        // Nothing listens on this address.
        let checker = InviteChecker::new("http://127.0.0.1:1".to_string(), CHECK_TIMEOUT);
        assert_eq!(checker.check(&code("demo")).await, Availability::Unknown);
    }
}
