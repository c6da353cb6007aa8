//! JWT creation and verification.
//!
//! Production tokens are minted by the identity provider with the shared
//! `JWT_SECRET`. [`create_access_token`] exists for the admin CLI and for tests.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use timetabler_config::JwtConfig;
use timetabler_core::AppError;
use timetabler_models::Role;

use crate::claims::Claims;

/// Creates an access token for `user_id` valid for the configured expiry.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: &str,
    name: &str,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry.max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        role,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

/// Verifies signature and expiry and returns the embedded claims.
///
/// # Errors
///
/// Returns an unauthorized error if the token is malformed, expired or signed
/// with a different secret.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}
