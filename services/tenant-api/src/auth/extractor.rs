use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthError, AuthMethod, TenantContext, AUTHORIZATION_HEADER, TENANT_ID_HEADER};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JwtClaims {
    sub: Option<String>,
    tenant_id: Option<String>,
    tid: Option<String>,
    roles: Option<Vec<String>>,
    exp: Option<usize>,
}

/// Resolves the calling tenant from request headers: an HS256 bearer
/// token when a secret is configured, otherwise the X-Tenant-ID header
/// (testing mode).
pub struct TenantExtractor {
    jwt_decoding_key: Option<DecodingKey>,
    jwt_validation: Option<Validation>,
}

impl TenantExtractor {
    pub fn new(jwt_secret: Option<&str>) -> Self {
        match jwt_secret {
            Some(secret) => {
                let mut validation = Validation::new(Algorithm::HS256);
                validation.algorithms = vec![Algorithm::HS256];
                Self {
                    jwt_decoding_key: Some(DecodingKey::from_secret(secret.as_bytes())),
                    jwt_validation: Some(validation),
                }
            }
            None => Self {
                jwt_decoding_key: None,
                jwt_validation: None,
            },
        }
    }

    pub fn jwt_enabled(&self) -> bool {
        self.jwt_decoding_key.is_some()
    }

    pub fn extract_from_jwt(&self, token: &str) -> Result<TenantContext, AuthError> {
        let (decoding_key, validation) = match (&self.jwt_decoding_key, &self.jwt_validation) {
            (Some(key), Some(validation)) => (key, validation),
            _ => return Err(AuthError::MissingCredentials),
        };

        let token_data = decode::<JwtClaims>(token, decoding_key, validation)?;
        let claims = token_data.claims;

        let tenant_id = claims
            .tenant_id
            .or(claims.tid)
            .ok_or(AuthError::TenantIdNotFound)?;

        let mut context = TenantContext::new(tenant_id, AuthMethod::Jwt);

        if let Some(user_id) = claims.sub {
            context = context.with_user_id(user_id);
        }
        if let Some(roles) = claims.roles {
            if !roles.is_empty() {
                context = context.with_roles(roles);
            }
        }

        Ok(context)
    }

    pub fn extract_from_request(&self, headers: &HeaderMap) -> Result<TenantContext, AuthError> {
        if self.jwt_enabled() {
            let token = headers
                .get(AUTHORIZATION_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .ok_or(AuthError::MissingCredentials)?;
            return self.extract_from_jwt(token);
        }

        if let Some(tenant_header) = headers.get(TENANT_ID_HEADER) {
            if let Ok(tenant_id) = tenant_header.to_str() {
                if !tenant_id.trim().is_empty() {
                    debug!(tenant_id, "using X-Tenant-ID header (testing mode)");
                    return Ok(TenantContext::new(
                        tenant_id.to_string(),
                        AuthMethod::Header,
                    ));
                }
            }
        }

        Err(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";

    fn mint(secret: &str, tenant_id: Option<&str>) -> String {
        let exp = (Utc::now() + Duration::hours(1)).timestamp() as usize;
        let claims = JwtClaims {
            sub: Some("user-1".to_string()),
            tenant_id: tenant_id.map(|id| id.to_string()),
            tid: None,
            roles: Some(vec!["agent".to_string()]),
            exp: Some(exp),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token should encode")
    }

    #[test]
    fn valid_token_resolves_tenant() {
        let extractor = TenantExtractor::new(Some(SECRET));
        let context = extractor
            .extract_from_jwt(&mint(SECRET, Some("tenant-a")))
            .expect("token should validate");

        assert_eq!(context.tenant_id, "tenant-a");
        assert_eq!(context.user_id.as_deref(), Some("user-1"));
        assert_eq!(context.roles, vec!["agent".to_string()]);
        assert_eq!(context.auth_method, AuthMethod::Jwt);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let extractor = TenantExtractor::new(Some(SECRET));
        let result = extractor.extract_from_jwt(&mint("other-secret", Some("tenant-a")));
        assert!(matches!(result, Err(AuthError::InvalidJwt(_))));
    }

    #[test]
    fn token_without_tenant_claim_is_rejected() {
        let extractor = TenantExtractor::new(Some(SECRET));
        let result = extractor.extract_from_jwt(&mint(SECRET, None));
        assert!(matches!(result, Err(AuthError::TenantIdNotFound)));
    }

    #[test]
    fn header_fallback_only_without_secret() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("tenant-b"));

        let open = TenantExtractor::new(None);
        let context = open
            .extract_from_request(&headers)
            .expect("header should authenticate in testing mode");
        assert_eq!(context.tenant_id, "tenant-b");
        assert_eq!(context.auth_method, AuthMethod::Header);

        let locked = TenantExtractor::new(Some(SECRET));
        let result = locked.extract_from_request(&headers);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }
}
