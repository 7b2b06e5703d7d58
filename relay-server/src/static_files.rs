// relay-server/src/static_files.rs
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{web, HttpResponse};
use common::StaticFilesConfig;
use std::path::PathBuf;

/// Serve the front-end from `config.path`; unknown non-API paths fall back to the index page
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    let root = PathBuf::from(&config.path);
    let index_path = root.join(&config.index);

    cfg.service(
        Files::new("/", &root)
            .index_file(config.index.clone())
            .prefer_utf8(true)
            .use_etag(true)
            .use_last_modified(true)
            .default_handler(fn_service(move |req: ServiceRequest| {
                let index_path = index_path.clone();
                async move {
                    let (req, _) = req.into_parts();

                    if req.path().starts_with("/api/") {
                        return Ok::<_, actix_web::Error>(ServiceResponse::new(req, HttpResponse::NotFound().finish()));
                    }

                    let response = match NamedFile::open_async(&index_path).await {
                        Ok(file) => file.into_response(&req),
                        Err(e) => {
                            tracing::warn!("Index page {} unavailable: {}", index_path.display(), e);
                            HttpResponse::NotFound().finish()
                        }
                    };
                    Ok(ServiceResponse::new(req, response))
                }
            })),
    );
}
