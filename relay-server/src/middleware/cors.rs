// relay-server/src/middleware/cors.rs
use std::rc::Rc;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::{self, HeaderMap, HeaderName, HeaderValue}, Method},
    Error, HttpResponse,
};
use common::CorsConfig;
use futures_util::future::{ready, LocalBoxFuture, Ready};

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Authorization";

/// Permissive CORS for local development. Preflights are answered here
/// and never reach the routes.
#[derive(Debug, Clone)]
pub struct Cors {
    enabled: bool,
    headers: Rc<Vec<(HeaderName, HeaderValue)>>,
}

impl Cors {
    pub fn new(config: &CorsConfig) -> Self {
        let origin = HeaderValue::from_str(&config.allow_origin).unwrap_or_else(|_| {
            tracing::warn!("Invalid CORS origin {:?}, using *", config.allow_origin);
            HeaderValue::from_static("*")
        });

        Self {
            enabled: config.enabled,
            headers: Rc::new(vec![
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
                (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
                (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
                (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true")),
            ]),
        }
    }

    fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddleware {
            service,
            cors: self.clone(),
        }))
    }
}

pub struct CorsMiddleware<S> {
    service: S,
    cors: Cors,
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.cors.enabled {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        if req.method() == Method::OPTIONS {
            let mut response = HttpResponse::Ok().finish();
            self.cors.apply(response.headers_mut());
            let (http_req, _payload) = req.into_parts();
            return Box::pin(async move {
                Ok(ServiceResponse::new(http_req, response).map_into_right_body())
            });
        }

        let cors = self.cors.clone();
        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            cors.apply(res.headers_mut());
            Ok(res.map_into_left_body())
        })
    }
}
