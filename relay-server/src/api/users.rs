// relay-server/src/api/users.rs
use actix_web::{post, web, HttpResponse};
use common::models::relay::{
    AcceptInvitationRequest, SignupRequest, SignupResult, UpstreamInvitationAccept, UserInvite,
    DEFAULT_MEMBER_ROLE,
};
use common::Config;
use serde_json::Value;
use url::Url;

use crate::api::relay_with_cookies;
use crate::error::{RelayError, INVITATION_MESSAGES, SIGNUP_MESSAGES};
use crate::upstream::UpstreamClient;

// Create the user in n8n through the public API and return its invitation link
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    upstream: web::Data<UpstreamClient>,
) -> Result<HttpResponse, RelayError> {
    let email = non_empty(&body.email)
        .ok_or_else(|| RelayError::Validation("Email is required".to_string()))?;

    if !upstream.has_api_key() {
        tracing::error!("Signup requested but no n8n API key is configured");
        return Err(RelayError::NotConfigured("User provisioning is not configured".to_string()));
    }

    let invite = UserInvite {
        email: email.to_string(),
        role: non_empty(&body.role).unwrap_or(DEFAULT_MEMBER_ROLE).to_string(),
    };

    tracing::info!(email = %invite.email, role = %invite.role, "Provisioning n8n user");

    let response = upstream.create_user(&invite).await.map_err(|e| {
        tracing::error!("User creation failed: {}", e);
        RelayError::from_upstream(e, &SIGNUP_MESSAGES)
    })?;

    let invite_accept_url = invite_accept_url(&response.body);
    if invite_accept_url.is_none() {
        tracing::warn!("No invitation URL found in n8n response");
    }

    Ok(HttpResponse::Ok().json(SignupResult {
        success: true,
        message: "User created successfully".to_string(),
        data: response.body,
        invite_accept_url,
    }))
}

// Complete an invitation; n8n logs the new user in, so cookies are relayed like a login
#[post("/invitations/accept")]
pub async fn accept_invitation(
    body: web::Json<AcceptInvitationRequest>,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
) -> Result<HttpResponse, RelayError> {
    let ids = InvitationIds::from_request(&body)?;

    let (first_name, last_name, password) =
        match (non_empty(&body.first_name), non_empty(&body.last_name), non_empty(&body.password)) {
            (Some(first), Some(last), Some(password)) => (first, last, password),
            _ => {
                return Err(RelayError::Validation(
                    "First name, last name and password are required".to_string(),
                ))
            }
        };

    tracing::info!(invitee_id = %ids.invitee_id, "Accepting n8n invitation");

    let accept = UpstreamInvitationAccept {
        inviter_id: &ids.inviter_id,
        first_name,
        last_name,
        password,
    };
    let response = upstream.accept_invitation(&ids.invitee_id, &accept).await.map_err(|e| {
        tracing::error!("Invitation acceptance failed: {}", e);
        RelayError::from_upstream(e, &INVITATION_MESSAGES)
    })?;

    Ok(relay_with_cookies(response, "Invitation accepted", &config.cookie_policy))
}

/// `data[0].user.inviteAcceptUrl` of the user API response
pub fn invite_accept_url(body: &Value) -> Option<String> {
    body.pointer("/0/user/inviteAcceptUrl")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvitationIds {
    pub inviter_id: String,
    pub invitee_id: String,
}

impl InvitationIds {
    /// Explicit ids win over the ones found in `inviteAcceptUrl`
    pub fn from_request(req: &AcceptInvitationRequest) -> Result<Self, RelayError> {
        let mut inviter_id = non_empty(&req.inviter_id).map(str::to_string);
        let mut invitee_id = non_empty(&req.invitee_id).map(str::to_string);

        if let Some(raw) = non_empty(&req.invite_accept_url) {
            // Relative links resolve against a placeholder origin; only the query matters
            let url = Url::parse("http://localhost/")
                .and_then(|base| base.join(raw))
                .map_err(|e| RelayError::Validation(format!("Invalid invitation URL: {}", e)))?;

            for (key, value) in url.query_pairs() {
                match key.as_ref() {
                    "inviterId" if inviter_id.is_none() => inviter_id = Some(value.into_owned()),
                    "inviteeId" if invitee_id.is_none() => invitee_id = Some(value.into_owned()),
                    _ => {}
                }
            }
        }

        match (inviter_id, invitee_id) {
            (Some(inviter_id), Some(invitee_id)) => Ok(Self { inviter_id, invitee_id }),
            _ => Err(RelayError::Validation("Invitation identifiers are required".to_string())),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
