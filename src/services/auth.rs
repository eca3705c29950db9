use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{
    hash_password, verify_password, AuthResponse, LoginRequest, RegisterRequest, TokenIssuer,
    TokenKind,
};
use crate::error::AppError;
use crate::filter::ConditionSet;
use crate::models::{Role, User, UserSummary};
use crate::repository::Repository;

/// Registration, login and token rotation.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn Repository<User>>,
    issuer: TokenIssuer,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn Repository<User>>, issuer: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self {
            users,
            issuer,
            bcrypt_cost,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    fn respond(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            access_token: self.issuer.issue(user, TokenKind::Access)?,
            refresh_token: self.issuer.issue(user, TokenKind::Refresh)?,
            user: UserSummary::from(user),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users
            .find_one(&ConditionSet::new().eq("email", email), &[])
            .await
    }

    /// Creates a `user`-role account and signs it in.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        if self.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let user = User::new(request.email, request.full_name, Role::User, password_hash);
        let user = self.users.insert(&user).await?;

        log::info!("registered user {}", user.id);
        self.respond(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".into());

        let user = self.find_by_email(&request.email).await?.ok_or_else(invalid)?;
        if !verify_password(&request.password, &user.password_hash)? {
            return Err(invalid());
        }

        log::info!("user {} logged in", user.id);
        self.respond(&user)
    }

    /// Exchanges a valid refresh token for a new token pair.
    ///
    /// The user is re-read so a deleted account or a changed role takes effect.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let claims = self.issuer.verify(refresh_token, TokenKind::Refresh)?;
        let user = self
            .users
            .find_one(&ConditionSet::new().eq("id", claims.sub), &[])
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;

        self.respond(&user)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserSummary, AppError> {
        self.users
            .find_one(&ConditionSet::new().eq("id", user_id), &[])
            .await?
            .map(|user| UserSummary::from(&user))
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}
