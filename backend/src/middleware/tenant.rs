use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{models::tenant::Tenant, AppState};

/// Slugs are lowercase ASCII letters, digits and hyphens, 2 to 63 characters,
/// not starting or ending with a hyphen.
pub fn is_valid_slug(s: &str) -> bool {
    let len = s.len();
    (2..=63).contains(&len)
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Tenant resolved from the `X-Tenant` header or the first subdomain, checked
/// against the `tenants` table.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub id: Uuid,
    pub slug: String,
}

impl FromRequestParts<AppState> for TenantContext {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let slug = extract_slug(parts)?;

        let tenant: Option<Tenant> = sqlx::query_as(
            "SELECT id, slug, name, timezone, is_active, created_at FROM public.tenants WHERE slug = $1",
        )
        .bind(&slug)
        .fetch_optional(&state.db)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Database error" }))))?;

        match tenant {
            None => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "Tenant not found" })))),
            Some(t) if !t.is_active => {
                Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Tenant is inactive" }))))
            }
            Some(t) => Ok(TenantContext { id: t.id, slug: t.slug }),
        }
    }
}

fn extract_slug(parts: &Parts) -> Result<String, (StatusCode, Json<Value>)> {
    // 1. X-Tenant header
    if let Some(tenant) = parts
        .headers
        .get("X-Tenant")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
    {
        if !is_valid_slug(&tenant) {
            return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid tenant identifier" }))));
        }
        return Ok(tenant);
    }

    // 2. Subdomain from Host header
    if let Some(host) = parts.headers.get("Host").and_then(|v| v.to_str().ok()) {
        if let Some(subdomain) = subdomain_of(host) {
            if !is_valid_slug(&subdomain) {
                return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid tenant identifier" }))));
            }
            return Ok(subdomain);
        }
    }

    Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing X-Tenant header" }))))
}

/// First label of a host with at least three labels, ignoring `www` and `api`.
fn subdomain_of(host: &str) -> Option<String> {
    let domain = host.split(':').next().unwrap_or(host);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 3 {
        return None;
    }
    let subdomain = labels[0].to_lowercase();
    if subdomain == "www" || subdomain == "api" {
        return None;
    }
    Some(subdomain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(is_valid_slug("al-noor"));
        assert!(is_valid_slug("school42"));
        assert!(!is_valid_slug("a"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("Upper"));
        assert!(!is_valid_slug("semi;colon"));
    }

    #[test]
    fn subdomain_extraction() {
        assert_eq!(subdomain_of("al-noor.example.org:8080"), Some("al-noor".into()));
        assert_eq!(subdomain_of("www.example.org"), None);
        assert_eq!(subdomain_of("example.org"), None);
    }
}
