// relay-server/src/lib.rs
pub mod api;
pub mod cookies;
pub mod error;
pub mod middleware;
pub mod static_files;
pub mod upstream;

use actix_web::web;
use common::Config;

use crate::upstream::UpstreamClient;

/// Register shared state, the `/api` scope and the static front-end.
/// The API is registered first so the catch-all file service never shadows it.
pub fn configure_app(
    cfg: &mut web::ServiceConfig,
    config: web::Data<Config>,
    upstream: web::Data<UpstreamClient>,
) {
    let static_files = config.static_files.clone();

    cfg.app_data(config).app_data(upstream);
    api::configure(cfg);
    static_files::configure(cfg, &static_files);
}
