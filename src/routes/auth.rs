use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{get, post, web, HttpRequest, HttpResponse, HttpResponseBuilder, Responder};
use validator::Validate;

use crate::{
    auth::{AuthResponse, CurrentUser, LoginRequest, RefreshRequest, RegisterRequest, TokenKind},
    config::Config,
    error::AppError,
    services::AuthService,
};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie<'c>(name: &'c str, value: String, max_age: i64, secure: bool) -> Cookie<'c> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(max_age))
        .finish()
}

/// Answers with the token pair in the body and in both session cookies.
fn with_session(
    mut builder: HttpResponseBuilder,
    service: &AuthService,
    config: &Config,
    auth: AuthResponse,
) -> HttpResponse {
    let issuer = service.issuer();
    let secure = config.is_production();
    builder
        .cookie(session_cookie(
            ACCESS_COOKIE,
            auth.access_token.clone(),
            issuer.ttl(TokenKind::Access),
            secure,
        ))
        .cookie(session_cookie(
            REFRESH_COOKIE,
            auth.refresh_token.clone(),
            issuer.ttl(TokenKind::Refresh),
            secure,
        ))
        .json(auth)
}

/// Register a new user
///
/// Creates a `user`-role account and signs it in.
///
/// ## Responses:
/// - `201 Created`: `AuthResponse` plus the `accessToken`/`refreshToken` cookies.
/// - `409 Conflict`: If the email is already registered.
/// - `422 Unprocessable Entity`: If the payload fails validation.
#[post("/register")]
pub async fn register(
    service: web::Data<AuthService>,
    config: web::Data<Config>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let auth = service.register(register_data.into_inner()).await?;
    Ok(with_session(HttpResponse::Created(), &service, &config, auth))
}

/// Login user
///
/// Authenticates a user and returns a fresh token pair. Unknown email and wrong password
/// are indistinguishable (`401 Unauthorized`).
#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let auth = service.login(login_data.into_inner()).await?;
    Ok(with_session(HttpResponse::Ok(), &service, &config, auth))
}

/// Issues a new token pair from the `refreshToken` cookie, or from a
/// `{"refresh_token": ...}` body when no cookie is sent.
#[post("/refresh")]
pub async fn refresh(
    req: HttpRequest,
    service: web::Data<AuthService>,
    config: web::Data<Config>,
    body: Option<web::Json<RefreshRequest>>,
) -> Result<impl Responder, AppError> {
    let token = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token))
        .ok_or_else(|| AppError::Unauthorized("Refresh token is missing".into()))?;

    let auth = service.refresh(&token).await?;
    Ok(with_session(HttpResponse::Ok(), &service, &config, auth))
}

#[post("/logout")]
pub async fn logout(user: CurrentUser) -> impl Responder {
    log::info!("user {} logged out", user.id());

    let mut response = HttpResponse::NoContent();
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        let mut cookie = Cookie::build(name, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish();
        cookie.make_removal();
        response.cookie(cookie);
    }
    response.finish()
}

#[get("/me")]
pub async fn me(
    user: CurrentUser,
    service: web::Data<AuthService>,
) -> Result<impl Responder, AppError> {
    let summary = service.me(user.id()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
