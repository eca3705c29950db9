use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{TokenIssuer, TokenKind};
use crate::error::AppError;

/// Paths reachable without an access token.
const PUBLIC_PATHS: [&str; 4] = [
    "/health",
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/refresh",
];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{}/", p)))
}

/// Validates the bearer access token and stores its [`Claims`](crate::auth::Claims) in
/// the request extensions. Needs a `web::Data<TokenIssuer>` registered on the app.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.path()) {
            return Box::pin(self.service.call(req));
        }

        let issuer = match req.app_data::<web::Data<TokenIssuer>>() {
            Some(issuer) => issuer.clone(),
            None => {
                let err = AppError::InternalServerError("Token issuer not configured".into());
                return Box::pin(async move { Err(err.into()) });
            }
        };

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let verified = match token {
            Some(token) => issuer.verify(token, TokenKind::Access),
            None => Err(AppError::Unauthorized("Access token is missing".into())),
        };

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Err(app_err) => {
                log::debug!("rejected request to {}: {}", req.path(), app_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public("/health"));
        assert!(is_public("/api/auth/login"));
        assert!(is_public("/api/auth/refresh"));
        assert!(!is_public("/api/auth/me"));
        assert!(!is_public("/api/auth/loginx"));
        assert!(!is_public("/api/tasks"));
    }
}
