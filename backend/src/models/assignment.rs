use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Point-in-time copy of a teaching assignment, stored as JSONB on rules and
/// sessions. Never refreshed once written to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    pub assignment_id: Uuid,
    pub tenant_id: Uuid,
    pub display_name: String,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub section_id: Uuid,
    pub section_name: String,
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub room_id: Option<Uuid>,
    pub room_name: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Joined directory row. Looked up by id only so that a tenant mismatch can be
/// told apart from a missing assignment.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub is_active: bool,
    pub is_deleted: bool,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub section_id: Uuid,
    pub section_name: String,
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub room_id: Option<Uuid>,
    pub room_name: Option<String>,
}

impl AssignmentRow {
    pub fn into_snapshot(self, captured_at: DateTime<Utc>) -> AssignmentSnapshot {
        AssignmentSnapshot {
            assignment_id: self.id,
            tenant_id: self.tenant_id,
            display_name: format!("{} - {}", self.subject_name, self.section_name),
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            section_id: self.section_id,
            section_name: self.section_name,
            teacher_id: self.teacher_id,
            teacher_name: self.teacher_name,
            room_id: self.room_id,
            room_name: self.room_name,
            captured_at,
        }
    }
}
