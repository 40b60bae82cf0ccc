//! JWT claim verification.
//!
//! Token issuance lives in the external auth collaborator; this Core only
//! verifies a bearer token into `{tenant_id, user_id, role}` and trusts it.
//! It never mints or refreshes tokens in production code.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CoreError, Request};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}

/// Verifies a bearer token's signature and expiry, returning its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, CoreError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| CoreError::Authorization(format!("invalid token: {e}")))?;
    Ok(data.claims)
}

/// Extracts and verifies the bearer token carried on a `Request<T>` envelope.
pub fn extract_auth<T>(request: &Request<T>, jwt_secret: &str) -> Result<AuthInfo, CoreError> {
    let token = request
        .token
        .as_deref()
        .ok_or_else(|| CoreError::Authorization("no authentication provided — JWT token is required".to_string()))?;
    let claims = verify_token(token, jwt_secret)?;
    Ok(AuthInfo {
        tenant_id: claims.tenant_id,
        user_id: claims.user_id,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const TEST_SECRET: &str = "test-secret-key-for-jwt-at-least-32-bytes-long";

    fn mint(secret: &str, tenant_id: Uuid, user_id: Uuid, role: &str, exp_offset_secs: i64) -> String {
        let claims = Claims {
            tenant_id,
            user_id,
            role: role.to_string(),
            exp: (Utc::now().timestamp() + exp_offset_secs) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn make_request_with_token(token: Option<String>) -> Request<crate::types::EmptyPayload> {
        Request {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            token,
            payload: crate::types::EmptyPayload::default(),
        }
    }

    #[test]
    fn verify_token_round_trips_claims() {
        let tenant_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let token = mint(TEST_SECRET, tenant_id, user_id, "dispatcher", 3600);

        let claims = verify_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.tenant_id, tenant_id);
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, "dispatcher");
    }

    #[test]
    fn verify_token_rejects_wrong_secret() {
        let token = mint(TEST_SECRET, Uuid::new_v4(), Uuid::new_v4(), "dispatcher", 3600);
        assert!(verify_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn verify_token_rejects_expired_token() {
        let token = mint(TEST_SECRET, Uuid::new_v4(), Uuid::new_v4(), "dispatcher", -3600);
        assert!(verify_token(&token, TEST_SECRET).is_err());
    }

    #[test]
    fn verify_token_rejects_malformed_token() {
        assert!(verify_token("not-a-jwt", TEST_SECRET).is_err());
    }

    #[test]
    fn extract_auth_requires_token() {
        let request = make_request_with_token(None);
        let err = extract_auth(&request, TEST_SECRET).unwrap_err();
        assert_eq!(err.code(), "AUTHORIZATION_ERROR");
    }

    #[test]
    fn extract_auth_rejects_invalid_token() {
        let request = make_request_with_token(Some("bad-token".to_string()));
        assert!(extract_auth(&request, TEST_SECRET).is_err());
    }

    #[test]
    fn extract_auth_resolves_tenant_from_token() {
        let tenant_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let token = mint(TEST_SECRET, tenant_id, user_id, "owner", 3600);
        let request = Request::with_token(token, crate::types::EmptyPayload::default());

        let auth = extract_auth(&request, TEST_SECRET).unwrap();
        assert_eq!(auth.tenant_id, tenant_id);
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.role, "owner");
    }
}
