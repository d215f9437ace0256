use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::modules::users::entities::{enums::Role, user};
use crate::shared::config::Config;
use crate::shared::error::{AppError, AppResult};

/// Authenticated actor as supplied by the session layer. The role claim is
/// trusted unconditionally downstream; permission boundaries match on it
/// exhaustively.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User UUID
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

pub struct AuthService;

impl AuthService {
    pub fn generate_token(config: &Config, user: &user::Model) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::hours(24))
            .expect("valid timestamp")
            .timestamp() as usize;

        let claims = Claims {
            sub: user.uuid.clone(),
            role: user.role,
            exp: expiration,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalServerError(format!("JWT generation failed: {}", e)))
    }
}
