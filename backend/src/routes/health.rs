use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET /health: database round-trip plus pool occupancy.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let pool = json!({ "size": state.db.size(), "idle": state.db.num_idle() });
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected", "pool": pool })),
        ),
        Err(e) => {
            tracing::warn!("Health check: database unreachable: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "db": e.to_string(), "pool": pool })),
            )
        }
    }
}
