//! HTTP implementation of the status service.

use anyhow::{Context, Result};
use tracing::debug;

use super::{Status, StatusError, StatusResult, StatusService, ToggleRequest};

/// Path of the status resource, relative to the base URL.
pub const STATUS_PATH: &str = "/api/site-status";

/// Standard User-Agent header for sitectl requests.
pub const USER_AGENT: &str = concat!("sitectl/", env!("CARGO_PKG_VERSION"));

/// Base URL of the status backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEndpoint {
    base_url: String,
}

impl StatusEndpoint {
    /// Parses and validates a base URL.
    ///
    /// Trailing slashes are dropped so the status path joins cleanly.
    ///
    /// # Errors
    /// Returns an error if the URL is empty, malformed, not http(s), or
    /// carries a query or fragment.
    pub fn parse(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            anyhow::bail!("Base URL is empty");
        }
        let url = url::Url::parse(trimmed)
            .with_context(|| format!("Invalid status base URL: {trimmed}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Status base URL must use http or https: {trimmed}");
        }
        // the status path is appended to the raw string
        if url.query().is_some() || url.fragment().is_some() {
            anyhow::bail!("Status base URL must not contain a query or fragment: {trimmed}");
        }
        Ok(Self {
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the status resource.
    pub fn status_url(&self) -> String {
        format!("{}{}", self.base_url, STATUS_PATH)
    }
}

/// Talks to the status backend over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatusService {
    http: reqwest::Client,
    endpoint: StatusEndpoint,
}

impl HttpStatusService {
    /// Creates a service for the given endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: StatusEndpoint) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &StatusEndpoint {
        &self.endpoint
    }

    async fn read_status(response: reqwest::Response) -> StatusResult<Status> {
        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            return Err(StatusError::rejected(status.as_u16(), &body));
        }
        serde_json::from_str::<Status>(&body).map_err(|e| {
            let mut err = StatusError::parse(format!("Invalid status response: {e}"));
            err.details = Some(body);
            err
        })
    }
}

impl StatusService for HttpStatusService {
    async fn fetch_status(&self) -> StatusResult<Status> {
        let url = self.endpoint.status_url();
        debug!(%url, "GET site status");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        Self::read_status(response).await
    }

    async fn write_status(&self, live: bool) -> StatusResult<Status> {
        let url = self.endpoint.status_url();
        debug!(%url, live, "POST site status");
        // `.json()` sets `Content-Type: application/json`
        let response = self
            .http
            .post(&url)
            .json(&ToggleRequest { live })
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        Self::read_status(response).await
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> StatusError {
    if e.is_timeout() {
        StatusError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        StatusError::network(format!("Connection failed: {e}"))
    } else if e.is_decode() || e.is_body() {
        StatusError::network(format!("Failed to read response: {e}"))
    } else {
        StatusError::network(format!("Network error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::status::StatusErrorKind;

    fn service_for(server: &MockServer) -> HttpStatusService {
        HttpStatusService::new(StatusEndpoint::parse(&server.uri()).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let endpoint = StatusEndpoint::parse("https://example.com/").unwrap();
        assert_eq!(endpoint.base_url(), "https://example.com");
        assert_eq!(
            endpoint.status_url(),
            "https://example.com/api/site-status"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_urls() {
        assert!(StatusEndpoint::parse("").is_err());
        assert!(StatusEndpoint::parse("   ").is_err());
        assert!(StatusEndpoint::parse("not a url").is_err());
        assert!(StatusEndpoint::parse("ftp://example.com").is_err());
    }

    #[test]
    fn test_endpoint_rejects_query_and_fragment() {
        assert!(StatusEndpoint::parse("https://x.test/?a=1").is_err());
        assert!(StatusEndpoint::parse("https://x.test/admin?").is_err());
        assert!(StatusEndpoint::parse("https://x.test/#frag").is_err());

        let endpoint = StatusEndpoint::parse("https://x.test/admin/").unwrap();
        assert_eq!(endpoint.status_url(), "https://x.test/admin/api/site-status");
    }

    #[tokio::test]
    async fn test_fetch_status_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "isLive": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = service_for(&server).fetch_status().await.unwrap();
        assert_eq!(status, Status::LIVE);
    }

    #[tokio::test]
    async fn test_write_status_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STATUS_PATH))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({ "live": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "isLive": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = service_for(&server).write_status(false).await.unwrap();
        assert_eq!(status, Status::MAINTENANCE);
    }

    #[tokio::test]
    async fn test_non_2xx_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = service_for(&server).write_status(true).await.unwrap_err();
        assert_eq!(err.kind, StatusErrorKind::Rejected);
        assert_eq!(err.status, Some(500));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"live\":true}"))
            .mount(&server)
            .await;

        let err = service_for(&server).fetch_status().await.unwrap_err();
        assert_eq!(err.kind, StatusErrorKind::Parse);
        assert_eq!(err.details.as_deref(), Some("{\"live\":true}"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = StatusEndpoint::parse(&format!("http://127.0.0.1:{port}")).unwrap();
        let err = HttpStatusService::new(endpoint)
            .unwrap()
            .fetch_status()
            .await
            .unwrap_err();
        assert_eq!(err.kind, StatusErrorKind::Network);
    }
}
