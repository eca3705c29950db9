use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::Role;

/// The caller of a protected route, as established by `AuthMiddleware`.
///
/// Extraction fails with `AppError::Unauthorized` when the middleware did not run or
/// did not accept a token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.sub
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Fails with `AppError::Forbidden` unless the caller has `role`.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.0.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Requires the {} role",
                role.label()
            )))
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().cloned() {
            Some(claims) => ready(Ok(CurrentUser(claims))),
            None => {
                let err = AppError::Unauthorized(
                    "No authenticated user in request. Ensure AuthMiddleware is active.".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenKind;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "someone@example.com".into(),
            role,
            kind: TokenKind::Access,
            iat: 0,
            exp: 0,
        }
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        let claims = claims(Role::User);
        req.extensions_mut().insert(claims.clone());

        let mut payload = Payload::None;
        let user = CurrentUser::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(user.id(), claims.sub);
        assert_eq!(user.role(), Role::User);
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let err = CurrentUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[::core::prelude::v1::test]
    fn test_require_role() {
        let admin = CurrentUser(claims(Role::Admin));
        let user = CurrentUser(claims(Role::User));

        assert!(admin.require_role(Role::Admin).is_ok());
        assert!(matches!(
            user.require_role(Role::Admin),
            Err(AppError::Forbidden(_))
        ));
    }
}
