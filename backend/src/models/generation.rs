use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::SessionStatus;

/// Per-run overrides. Anything left unset falls back to the tenant's
/// timezone and then to the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationOptions {
    /// IANA zone name used to place rule times on calendar dates.
    pub timezone: Option<String>,
    /// Assignment used by rules that do not carry their own.
    pub default_assignment_ref: Option<Uuid>,
    pub default_attendance_status: Option<SessionStatus>,
    /// Max rows per insert statement.
    pub batch_size: Option<usize>,
}

/// Outcome of one generation run.
///
/// `skipped` counts candidates the store dropped because an equivalent or
/// overlapping live session already existed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub created: u64,
    pub candidates: u64,
    pub skipped: u64,
    pub warnings: Vec<String>,
}

impl GenerationResult {
    /// Warnings joined for the `generation_warning` response field.
    pub fn warning_summary(&self) -> Option<String> {
        if self.warnings.is_empty() {
            None
        } else {
            Some(self.warnings.join("; "))
        }
    }
}
