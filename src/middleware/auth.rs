use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use timetabler_auth::{Claims, verify_token};
use timetabler_core::AppError;
use timetabler_models::Role;

use crate::state::AppState;

/// Extractor that validates the bearer token and provides the caller's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.0.role == role
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that admits only callers holding `$role`.
#[macro_export]
macro_rules! require_role {
    ($name:ident, $role:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = timetabler_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !auth_user.has_role($role) {
                    return Err(timetabler_core::AppError::forbidden(format!(
                        "Access denied. Requires the {} role",
                        $role
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireAdmin, Role::Admin);
