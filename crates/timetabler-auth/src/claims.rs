//! Access token claims.

use serde::{Deserialize, Serialize};
use timetabler_models::Role;
use utoipa::ToSchema;

/// JWT claims for access tokens.
///
/// Everything the API needs to authorize a request is in the token, so no
/// user lookup happens per request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User id assigned by the identity provider (subject claim)
    pub sub: String,
    /// Display name, copied onto leave requests
    pub name: String,
    pub role: Role,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let claims = Claims {
            sub: "uid-123".to_string(),
            name: "Dr. Rao".to_string(),
            role: Role::Teacher,
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"uid-123""#));
        assert!(serialized.contains(r#""role":"Teacher""#));
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"uid-456","name":"Office","role":"Admin","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "uid-456");
        assert_eq!(claims.exp, 9999999999);
        assert!(claims.is_admin());
    }

    #[test]
    fn test_claims_reject_unknown_role() {
        let json = r#"{"sub":"uid-1","name":"X","role":"Principal","exp":1,"iat":1}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }
}
