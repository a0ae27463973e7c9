use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::models::auth::{AuthenticatedUser, Claims};
use crate::models::user::UserRole;

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing Authorization header"))?
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid Authorization header format"))?;

        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "JWT secret not configured"))?;

        let user = decode_access_token(token, &secret.0)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;

        // A non-super-admin token only works for the tenant it was issued for.
        if user.role != UserRole::SuperAdmin {
            if let Some(x_tenant) = parts.headers.get("X-Tenant").and_then(|v| v.to_str().ok()) {
                if user.tenant != x_tenant.to_lowercase() {
                    return Err((StatusCode::FORBIDDEN, "Tenant mismatch"));
                }
            }
        }

        Ok(user)
    }
}

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

pub fn decode_access_token(token: &str, secret: &str) -> Result<AuthenticatedUser, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = decode::<Claims>(token, &key, &validation)?.claims;

    Ok(AuthenticatedUser {
        user_id: claims.sub.parse()?,
        tenant: claims.tenant,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(role: UserRole, exp_offset: i64, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            tenant: "al-noor".into(),
            role,
            exp: (now + exp_offset) as usize,
            iat: now as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_decodes_role_and_tenant() {
        let user = decode_access_token(&token(UserRole::Admin, 600, "s3cret"), "s3cret").unwrap();
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.tenant, "al-noor");
    }

    #[test]
    fn wrong_secret_or_expired_token_is_rejected() {
        assert!(decode_access_token(&token(UserRole::Admin, 600, "s3cret"), "other").is_err());
        assert!(decode_access_token(&token(UserRole::Admin, -3600, "s3cret"), "s3cret").is_err());
    }
}
