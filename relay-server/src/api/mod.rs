// relay-server/src/api/mod.rs
pub mod auth;
pub mod health;
pub mod projects;
pub mod users;

use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest, HttpResponse};
use common::models::relay::RelayResult;
use common::CookiePolicy;

use crate::cookies::rewrite_all;
use crate::error::RelayError;
use crate::upstream::UpstreamResponse;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .service(health::health)
            .service(auth::login)
            .service(auth::me)
            .service(auth::logout)
            .service(users::signup)
            .service(users::accept_invitation)
            .service(projects::personal_project)
    );
}

// Malformed bodies get the same envelope as missing fields
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!("Rejected request body: {}", err);
    RelayError::Validation(format!("Invalid request body: {}", err)).into()
}

/// Success envelope for relays that log the caller in upstream.
/// Every upstream cookie is rewritten for the local origin and set on the response.
pub(crate) fn relay_with_cookies(response: UpstreamResponse, message: &str, policy: &CookiePolicy) -> HttpResponse {
    tracing::info!("Cookies received from n8n: {}", response.set_cookies.len());

    let mut builder = HttpResponse::Ok();
    for cookie in rewrite_all(&response.set_cookies, policy) {
        tracing::info!("Set cookie: {}", cookie.name());
        builder.cookie(cookie);
    }

    builder.json(RelayResult {
        success: true,
        message: Some(message.to_string()),
        data: Some(response.body),
        cookies: Some(response.set_cookies),
        status: Some(response.status),
        ..Default::default()
    })
}
