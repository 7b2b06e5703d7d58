// relay-server/src/main.rs
use actix_web::{web, App, HttpServer};
use common::{setup_tracing, Config};
use relay_server::middleware::cors::Cors;
use relay_server::upstream::UpstreamClient;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load configuration
    let config = Config::from_env();

    let upstream = UpstreamClient::new(&config.upstream).map_err(|e| {
        tracing::error!("Failed to build upstream HTTP client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    if config.upstream.api_key.is_none() {
        tracing::warn!("No n8n API key configured, /api/signup will answer 503");
    }
    if !config.cookie_policy.http_only || !config.cookie_policy.secure {
        tracing::warn!("Relayed cookies are readable from scripts or sent over plain HTTP; development policy in effect");
    }

    // Save address before moving config into web::Data
    let server_addr = config.server_addr.clone();
    log_banner(&config);

    let config_data = web::Data::new(config);
    let upstream_data = web::Data::new(upstream);

    HttpServer::new(move || {
        let config_data = config_data.clone();
        let upstream_data = upstream_data.clone();
        App::new()
            .wrap(Cors::new(&config_data.cors))
            .configure(|cfg| relay_server::configure_app(cfg, config_data, upstream_data))
    })
    .bind(&server_addr)?
    .run()
    .await
}

fn log_banner(config: &Config) {
    tracing::info!("n8n auth relay starting on http://{}", config.server_addr);
    tracing::info!("n8n server: {}", config.upstream.base());
    tracing::info!("Serving files from: {}", config.static_files.path);
    tracing::info!("Session cookie: {}", config.session.cookie_name);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                        - Main application");
    tracing::info!("  POST /api/login               - Proxy n8n login");
    tracing::info!("  GET  /api/me                  - Check session");
    tracing::info!("  POST /api/logout              - End session");
    tracing::info!("  POST /api/signup              - Provision n8n user");
    tracing::info!("  POST /api/invitations/accept  - Accept n8n invitation");
    tracing::info!("  GET  /api/projects/personal   - Personal project details");
    tracing::info!("  GET  /api/health              - Health check");
}
