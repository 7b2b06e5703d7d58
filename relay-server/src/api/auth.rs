// relay-server/src/api/auth.rs
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::Cookie;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use common::models::relay::{LoginRequest, RelayResult};
use common::Config;

use crate::api::relay_with_cookies;
use crate::cookies::extract_session_token;
use crate::error::{RelayError, LOGIN_MESSAGES};
use crate::upstream::UpstreamClient;

// Forward the credential pair to n8n and hand its session cookies to the browser
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
) -> Result<HttpResponse, RelayError> {
    let credential = body
        .credential()
        .ok_or_else(|| RelayError::Validation("Email and password are required".to_string()))?;

    tracing::info!(email = %credential.email, "Proxying login request to n8n");

    let response = upstream.login(&credential).await.map_err(|e| {
        tracing::error!("Login failed: {}", e);
        RelayError::from_upstream(e, &LOGIN_MESSAGES)
    })?;

    tracing::info!("n8n login successful");
    Ok(relay_with_cookies(response, "Authentication successful", &config.cookie_policy))
}

// Replay the session cookie against n8n's current-user endpoint
#[get("/me")]
pub async fn me(
    req: HttpRequest,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
) -> Result<HttpResponse, RelayError> {
    let cookie_name = &config.session.cookie_name;
    let token = extract_session_token(req.headers(), cookie_name).ok_or(RelayError::SessionMissing)?;

    let response = upstream.current_user(cookie_name, &token).await.map_err(|e| {
        // The reason stays in the log; callers only learn the session is invalid
        tracing::warn!("Session check failed: {}", e);
        RelayError::SessionInvalid
    })?;

    Ok(HttpResponse::Ok().json(RelayResult::ok(response.body)))
}

// Log out upstream when we can, and always drop the local session cookie
#[post("/logout")]
pub async fn logout(
    req: HttpRequest,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
) -> HttpResponse {
    let cookie_name = &config.session.cookie_name;

    if let Some(token) = extract_session_token(req.headers(), cookie_name) {
        match upstream.logout(cookie_name, &token).await {
            Ok(_) => tracing::info!("Upstream session closed"),
            Err(e) => tracing::warn!("Upstream logout failed: {}", e),
        }
    } else {
        tracing::info!("Logout without a session cookie");
    }

    let cookie = Cookie::build(cookie_name.clone(), "")
        .path(config.cookie_policy.default_path.clone())
        .max_age(CookieDuration::seconds(0))
        .finish();

    HttpResponse::Ok().cookie(cookie).json(
        RelayResult {
            success: true,
            ..Default::default()
        }
        .with_message("Logged out"),
    )
}
