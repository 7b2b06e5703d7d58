// relay-server/src/api/projects.rs
use actix_web::{get, web, HttpRequest, HttpResponse};
use common::models::relay::RelayResult;
use common::Config;
use serde_json::Value;

use crate::cookies::extract_session_token;
use crate::error::{FailureMessages, RelayError};
use crate::upstream::{UpstreamClient, UpstreamError};

const PROJECT_MESSAGES: FailureMessages = FailureMessages {
    generic: "Failed to fetch personal project details",
    unauthorized: "Session validation failed",
    conflict: None,
};

#[get("/projects/personal")]
pub async fn personal_project(
    req: HttpRequest,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
) -> Result<HttpResponse, RelayError> {
    let cookie_name = &config.session.cookie_name;
    let token = extract_session_token(req.headers(), cookie_name).ok_or(RelayError::SessionMissing)?;

    let response = upstream.personal_project(cookie_name, &token).await.map_err(|e| {
        tracing::warn!("Personal project lookup failed: {}", e);
        project_error(e)
    })?;

    Ok(HttpResponse::Ok().json(RelayResult::ok(unwrap_data(response.body))))
}

fn project_error(err: UpstreamError) -> RelayError {
    match err {
        UpstreamError::Status { status: 401, .. } => RelayError::SessionInvalid,
        UpstreamError::Status { status: 403, .. } => RelayError::Upstream {
            status: 403,
            message: "Insufficient permissions".to_string(),
            details: None,
        },
        UpstreamError::Status { status: 404, .. } => RelayError::Upstream {
            status: 404,
            message: "Personal project not found".to_string(),
            details: None,
        },
        other => RelayError::from_upstream(other, &PROJECT_MESSAGES),
    }
}

/// n8n's internal API wraps payloads as `{ "data": ... }`
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    }
}
