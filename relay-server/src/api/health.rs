// relay-server/src/api/health.rs
use actix_web::{get, web, HttpResponse, Responder};
use common::models::relay::HealthStatus;

use crate::upstream::UpstreamClient;

#[get("/health")]
pub async fn health(upstream: web::Data<UpstreamClient>) -> impl Responder {
    HttpResponse::Ok().json(HealthStatus::ok(upstream.base_url()))
}
