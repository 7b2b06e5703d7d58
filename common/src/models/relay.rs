// common/src/models/relay.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role assigned to provisioned users when the caller does not pick one
pub const DEFAULT_MEMBER_ROLE: &str = "global:member";

/// Login form posted by the browser. Fields are optional so that a missing
/// one surfaces as a validation error rather than a JSON parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A validated login pair
#[derive(Clone)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

// Keep the password out of logs
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginRequest {
    /// Both fields present and non-empty
    pub fn credential(&self) -> Option<Credential> {
        let email = self.email.as_deref().filter(|v| !v.is_empty())?;
        let password = self.password.as_deref().filter(|v| !v.is_empty())?;
        Some(Credential {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

/// Body of the upstream `/rest/login` call
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamLogin<'a> {
    pub email_or_ldap_login_id: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub role: Option<String>,
}

/// One entry of the batch sent to the upstream user API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInvite {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitationRequest {
    pub invite_accept_url: Option<String>,
    pub inviter_id: Option<String>,
    pub invitee_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// Body of `/rest/invitations/{inviteeId}/accept`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamInvitationAccept<'a> {
    pub inviter_id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
}

/// Uniform envelope returned by every relay endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelayResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RelayResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Response of the provisioning relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResult {
    pub success: bool,
    pub message: String,
    pub data: Value,
    pub invite_accept_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub server: String,
    pub upstream_url: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn ok(upstream_url: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            server: "n8n-auth-relay".to_string(),
            upstream_url: upstream_url.into(),
            timestamp: Utc::now(),
        }
    }
}
