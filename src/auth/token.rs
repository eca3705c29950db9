use crate::config::Config;
use crate::error::AppError;
use crate::models::{Role, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which secret signed a token. A refresh token is never accepted as an access token
/// and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token, the user's id.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub kind: TokenKind,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Signs and verifies access and refresh tokens.
///
/// Each kind has its own secret and lifetime, taken from [`Config`].
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenIssuer {
    pub fn new(access_secret: &str, refresh_secret: &str, access_ttl: i64, refresh_ttl: i64) -> Self {
        Self {
            access_secret: access_secret.to_string(),
            refresh_secret: refresh_secret.to_string(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_refresh_secret,
            config.jwt_expires_in,
            config.jwt_refresh_expires_in,
        )
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    /// Lifetime of a token of this kind, in seconds.
    pub fn ttl(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Generates a token of the given kind for `user`.
    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            kind,
            iat: now,
            exp: now + self.ttl(kind),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret(claims.kind)),
        )
        .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature and expiry and checks the token is of the expected kind.
    ///
    /// Returns `AppError::Unauthorized` for malformed, expired, mis-signed or
    /// wrong-kind tokens.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &Validation::default(),
        )
        .map(|data| data.claims)?;

        if claims.kind != kind {
            return Err(AppError::Unauthorized("Invalid token: wrong token kind".into()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("access_secret", "refresh_secret", 900, 3600)
    }

    fn user() -> User {
        User::new(
            "token@example.com".into(),
            "Token User".into(),
            Role::Admin,
            "hash".into(),
        )
    }

    #[test]
    fn test_token_generation_and_verification() {
        let issuer = issuer();
        let user = user();
        let token = issuer.issue(&user, TokenKind::Access).unwrap();
        let claims = issuer.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let issuer = issuer();
        let refresh = issuer.issue(&user(), TokenKind::Refresh).unwrap();

        assert!(issuer.verify(&refresh, TokenKind::Refresh).is_ok());
        match issuer.verify(&refresh, TokenKind::Access) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("Invalid token")),
            other => panic!("refresh token accepted as access token: {:?}", other),
        }
    }

    #[test]
    fn test_token_expiration() {
        let issuer = issuer();
        let now = chrono::Utc::now().timestamp();
        let user = user();
        let expired = issuer
            .sign(&Claims {
                sub: user.id,
                email: user.email.clone(),
                role: user.role,
                kind: TokenKind::Access,
                iat: now - 3 * 3600,
                exp: now - 2 * 3600,
            })
            .unwrap();

        match issuer.verify(&expired, TokenKind::Access) {
            Err(AppError::Unauthorized(msg)) => {
                assert!(msg.contains("Invalid token: ExpiredSignature"), "{}", msg)
            }
            Ok(_) => panic!("Token should have been invalid due to expiration"),
            Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let other = TokenIssuer::new("a_completely_different_secret", "x", 900, 3600);
        let token = other.issue(&user(), TokenKind::Access).unwrap();

        match issuer().verify(&token, TokenKind::Access) {
            Err(AppError::Unauthorized(msg)) => assert!(
                msg.contains("Invalid token: InvalidSignature")
                    || msg.contains("Invalid token: InvalidToken")
            ),
            Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
            Err(e) => panic!("Unexpected error type for invalid signature: {:?}", e),
        }
    }
}
