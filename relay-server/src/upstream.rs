// relay-server/src/upstream.rs
use std::time::Duration;

use common::models::relay::{Credential, UpstreamInvitationAccept, UpstreamLogin, UserInvite};
use common::UpstreamConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::RequestBuilder;
use serde_json::Value;
use thiserror::Error;

const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Transport-level outcome of a single upstream call
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot connect to upstream: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream responded with status {status}")]
    Status { status: u16, body: Value },

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl UpstreamError {
    fn classify(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else if err.is_connect() {
            UpstreamError::Connect(err)
        } else {
            UpstreamError::Transport(err)
        }
    }

    /// Upstream-provided `message` field, if the failure carried one
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            UpstreamError::Status { body, .. } => body.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Successful (2xx) upstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
    /// Raw `Set-Cookie` header values, in order
    pub set_cookies: Vec<String>,
}

/// Thin client for the handful of n8n endpoints the relay talks to.
/// Every method issues exactly one request; nothing is retried.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    login_timeout: Duration,
    session_timeout: Duration,
    admin_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        tracing::debug!(base_url = %config.base(), "Upstream client initialized");

        Ok(Self {
            http,
            base_url: config.base().to_string(),
            api_key: config.api_key.clone(),
            login_timeout: Duration::from_millis(config.login_timeout_ms),
            session_timeout: Duration::from_millis(config.session_timeout_ms),
            admin_timeout: Duration::from_millis(config.admin_timeout_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /rest/login`
    pub async fn login(&self, credential: &Credential) -> Result<UpstreamResponse, UpstreamError> {
        let body = UpstreamLogin {
            email_or_ldap_login_id: &credential.email,
            password: &credential.password,
        };
        let request = self
            .http
            .post(self.url("/rest/login"))
            .header(ACCEPT, "application/json")
            .json(&body);
        self.send(request, self.login_timeout).await
    }

    /// `GET /rest/me`, authenticated by the replayed session cookie only
    pub async fn current_user(&self, cookie_name: &str, token: &str) -> Result<UpstreamResponse, UpstreamError> {
        let request = self
            .http
            .get(self.url("/rest/me"))
            .header(COOKIE, format!("{}={}", cookie_name, token))
            .header(CONTENT_TYPE, "application/json");
        self.send(request, self.session_timeout).await
    }

    /// `GET /rest/projects/personal`
    pub async fn personal_project(&self, cookie_name: &str, token: &str) -> Result<UpstreamResponse, UpstreamError> {
        let request = self
            .http
            .get(self.url("/rest/projects/personal"))
            .header(COOKIE, format!("{}={}", cookie_name, token))
            .header(ACCEPT, "application/json");
        self.send(request, self.login_timeout).await
    }

    /// `POST /rest/logout`
    pub async fn logout(&self, cookie_name: &str, token: &str) -> Result<UpstreamResponse, UpstreamError> {
        let request = self
            .http
            .post(self.url("/rest/logout"))
            .header(COOKIE, format!("{}={}", cookie_name, token))
            .header(ACCEPT, "application/json");
        self.send(request, self.session_timeout).await
    }

    /// `POST /api/v1/users` with a single-element batch.
    /// Callers check `has_api_key` first; without a key the request goes out unauthenticated.
    pub async fn create_user(&self, invite: &UserInvite) -> Result<UpstreamResponse, UpstreamError> {
        let mut request = self
            .http
            .post(self.url("/api/v1/users"))
            .header(ACCEPT, "application/json")
            .json(&[invite]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        self.send(request, self.admin_timeout).await
    }

    /// `POST /rest/invitations/{inviteeId}/accept`
    pub async fn accept_invitation(
        &self,
        invitee_id: &str,
        body: &UpstreamInvitationAccept<'_>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let path = format!("/rest/invitations/{}/accept", urlencode_segment(invitee_id));
        let request = self
            .http
            .post(self.url(&path))
            .header(ACCEPT, "application/json")
            .json(body);
        self.send(request, self.admin_timeout).await
    }

    async fn send(&self, request: RequestBuilder, timeout: Duration) -> Result<UpstreamResponse, UpstreamError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::classify(e, timeout))?;

        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::classify(e, timeout))?;
        let body = parse_body(&text);

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(UpstreamResponse {
            status: status.as_u16(),
            body,
            set_cookies,
        })
    }
}

/// JSON when possible, the raw text otherwise, null for an empty body
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn urlencode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"a\":1}"), json!({ "a": 1 }));
        assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn test_upstream_message_only_from_status_bodies() {
        let err = UpstreamError::Status {
            status: 500,
            body: json!({ "message": "boom" }),
        };
        assert_eq!(err.upstream_message(), Some("boom"));
        assert_eq!(UpstreamError::Timeout(Duration::from_secs(1)).upstream_message(), None);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = UpstreamConfig {
            base_url: "http://n8n:5678/".to_string(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(client.url("/rest/me"), "http://n8n:5678/rest/me");
    }
}
