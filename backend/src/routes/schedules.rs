use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    middleware::tenant::TenantContext,
    models::{auth::AuthenticatedUser, generation::GenerationOptions, user::UserRole},
    services::{generator::GenerationError, store::StoreError},
    AppState,
};

fn generation_error_response(e: GenerationError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        GenerationError::NotFound(_) => StatusCode::NOT_FOUND,
        GenerationError::InvalidRange { .. }
        | GenerationError::InvalidTimezone(_)
        | GenerationError::InvalidOptions(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GenerationError::Storage(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        GenerationError::Storage(StoreError::Query(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        GenerationError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

/// Admins only, and only inside the tenant their token was issued for.
/// Super admins may act on any tenant.
fn authorize(user: &AuthenticatedUser, tenant: &TenantContext) -> Result<(), (StatusCode, Json<Value>)> {
    if !user.role.is_admin() {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Access denied" }))));
    }
    if user.role != UserRole::SuperAdmin && user.tenant != tenant.slug {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Tenant mismatch" }))));
    }
    Ok(())
}

/// POST /schedules/{id}/generate: admin only.
///
/// Body is optional; an empty body uses the tenant timezone and configured defaults.
pub async fn generate_sessions(
    State(state): State<AppState>,
    tenant: TenantContext,
    user: AuthenticatedUser,
    Path(schedule_id): Path<Uuid>,
    body: Option<Json<GenerationOptions>>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    authorize(&user, &tenant)?;
    let options = body.map(|Json(o)| o).unwrap_or_default();

    let cancel = CancellationToken::new();
    let timeout = {
        let cancel = cancel.clone();
        let secs = state.config.generation_timeout_secs;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            cancel.cancel();
        })
    };

    let outcome = state
        .generator
        .generate_for_schedule(tenant.id, schedule_id, &options, &cancel)
        .await;
    timeout.abort();

    let result = outcome.map_err(generation_error_response)?;
    tracing::info!(
        "Schedule {} generated by {} in '{}': {} created",
        schedule_id,
        user.user_id,
        tenant.slug,
        result.created
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "created": result.created,
            "candidates": result.candidates,
            "skipped": result.skipped,
            "generation_warning": result.warning_summary(),
            "warnings": result.warnings,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_map_to_distinct_statuses() {
        let cases = [
            (GenerationError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (GenerationError::InvalidTimezone("X".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                GenerationError::Storage(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (GenerationError::Cancelled, StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, expected) in cases {
            let (status, Json(body)) = generation_error_response(err);
            assert_eq!(status, expected);
            assert!(body["error"].is_string());
        }
    }

    fn user(role: UserRole, tenant: &str) -> AuthenticatedUser {
        AuthenticatedUser { user_id: Uuid::new_v4(), tenant: tenant.into(), role }
    }

    fn tenant(slug: &str) -> TenantContext {
        TenantContext { id: Uuid::new_v4(), slug: slug.into() }
    }

    #[test]
    fn admin_of_another_tenant_is_forbidden() {
        let (status, Json(body)) = authorize(&user(UserRole::Admin, "al-noor"), &tenant("other-school")).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Tenant mismatch");
    }

    #[test]
    fn admin_of_the_same_tenant_and_super_admin_are_allowed() {
        assert!(authorize(&user(UserRole::Admin, "al-noor"), &tenant("al-noor")).is_ok());
        assert!(authorize(&user(UserRole::SuperAdmin, "platform"), &tenant("al-noor")).is_ok());
    }

    #[test]
    fn non_admin_roles_are_forbidden() {
        let (status, _) = authorize(&user(UserRole::Teacher, "al-noor"), &tenant("al-noor")).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
