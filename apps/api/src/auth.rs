//! Tenant Context Resolver — the isolation boundary for every request.
//!
//! Resolved once per request via an Axum extractor and passed explicitly to
//! all downstream operations. Never read tenant identity from ambient state.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// Fixed demo tenant used when `allow_anonymous_demo` is enabled and no
/// bearer token is supplied.
pub const DEMO_TENANT_ID: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);

/// Authenticated tenant/user/role triple.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    tenant_id: Uuid,
    sub: String,
    role: Option<String>,
}

/// Decodes an HS256 bearer token into a tenant context.
/// Malformed, wrongly-signed, or claim-incomplete tokens all map to 401;
/// no partial context is ever produced.
pub fn resolve_token(token: &str, jwt_secret: &str) -> Result<TenantContext, AppError> {
    let key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Tenant tokens carry no expiry claim; signature and claim shape are the contract.
    validation.required_spec_claims.clear();
    validation.validate_exp = false;

    let data = decode::<Claims>(token, &key, &validation).map_err(|_| AppError::Unauthorized)?;

    Ok(TenantContext {
        tenant_id: data.claims.tenant_id,
        user_id: data.claims.sub,
        role: data.claims.role.unwrap_or_else(|| "user".to_string()),
    })
}

fn demo_context() -> TenantContext {
    TenantContext {
        tenant_id: DEMO_TENANT_ID,
        user_id: "demo-user".to_string(),
        role: "admin".to_string(),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match bearer {
            Some(token) => resolve_token(token, &state.config.jwt_secret),
            None if state.config.allow_anonymous_demo => Ok(demo_context()),
            None => Err(AppError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn make_token(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_extracts_tenant() {
        let tenant_id = Uuid::new_v4();
        let token = make_token(json!({
            "tenant_id": tenant_id,
            "sub": "user-1",
            "role": "admin"
        }));

        let ctx = resolve_token(&token, SECRET).unwrap();
        assert_eq!(ctx.tenant_id, tenant_id);
        assert_eq!(ctx.user_id, "user-1");
        assert_eq!(ctx.role, "admin");
    }

    #[test]
    fn test_role_defaults_to_user() {
        let token = make_token(json!({
            "tenant_id": Uuid::new_v4(),
            "sub": "user-1"
        }));

        let ctx = resolve_token(&token, SECRET).unwrap();
        assert_eq!(ctx.role, "user");
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            resolve_token("invalid.jwt.token", SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_missing_tenant_id_rejected() {
        let token = make_token(json!({ "sub": "user-1" }));
        assert!(matches!(
            resolve_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = make_token(json!({
            "tenant_id": Uuid::new_v4(),
            "sub": "user-1"
        }));
        assert!(matches!(
            resolve_token(&token, "other-secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_demo_context_shape() {
        let ctx = demo_context();
        assert_eq!(
            ctx.tenant_id.to_string(),
            "11111111-1111-1111-1111-111111111111"
        );
        assert_eq!(ctx.user_id, "demo-user");
        assert_eq!(ctx.role, "admin");
    }
}
