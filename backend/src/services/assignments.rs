use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::assignment::{AssignmentRow, AssignmentSnapshot},
    services::store::{SnapshotError, SnapshotProvider},
};

/// Resolves teaching assignments into snapshots.
pub struct PgAssignmentDirectory {
    pool: PgPool,
}

impl PgAssignmentDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotProvider for PgAssignmentDirectory {
    async fn snapshot(
        &self,
        tenant_id: Uuid,
        assignment_ref: Uuid,
    ) -> Result<AssignmentSnapshot, SnapshotError> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"SELECT a.id, a.tenant_id, a.is_active,
                      (a.deleted_at IS NOT NULL)               AS is_deleted,
                      sub.id                                   AS subject_id,
                      sub.name                                 AS subject_name,
                      sec.id                                   AS section_id,
                      sec.name                                 AS section_name,
                      t.id                                     AS teacher_id,
                      CONCAT(t.first_name, ' ', t.last_name)   AS teacher_name,
                      r.id                                     AS room_id,
                      r.name                                   AS room_name
               FROM public.teaching_assignments a
               JOIN public.subjects sub ON sub.id = a.subject_id
               JOIN public.sections sec ON sec.id = a.section_id
               JOIN public.teachers t   ON t.id   = a.teacher_id
               LEFT JOIN public.rooms r ON r.id   = a.room_id
               WHERE a.id = $1"#,
        )
        .bind(assignment_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SnapshotError::Store(e.into()))?;

        let row = match row {
            Some(row) if !row.is_deleted => row,
            _ => return Err(SnapshotError::NotFound(assignment_ref)),
        };
        if row.tenant_id != tenant_id {
            return Err(SnapshotError::ScopeViolation {
                assignment_id: assignment_ref,
                tenant_id,
            });
        }
        if !row.is_active {
            return Err(SnapshotError::Inactive(assignment_ref));
        }

        Ok(row.into_snapshot(Utc::now()))
    }
}
