use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    models::session::NewSession,
    services::store::{SessionStore, StoreError},
};

/// Append-only writer for `attendance_sessions`.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    /// A single multi-row INSERT, so a chunk commits or fails as a whole.
    /// `ON CONFLICT DO NOTHING` without a target covers both the unique index
    /// and the overlap exclusion constraints.
    async fn insert_skipping_conflicts(&self, rows: &[NewSession]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO public.attendance_sessions
                (tenant_id, schedule_id, rule_id, session_date, starts_at, ends_at,
                 status, assignment_snapshot, teacher_id, section_id, room_id) ",
        );
        qb.push_values(rows, |mut b, row| {
            b.push_bind(row.tenant_id)
                .push_bind(row.schedule_id)
                .push_bind(row.rule_id)
                .push_bind(row.session_date)
                .push_bind(row.starts_at)
                .push_bind(row.ends_at)
                .push_bind(row.status)
                .push_bind(Json(row.snapshot.clone()))
                .push_bind(row.teacher_id())
                .push_bind(row.section_id())
                .push_bind(row.room_id());
        });
        qb.push(" ON CONFLICT DO NOTHING RETURNING id");

        let inserted: Vec<Uuid> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;
        Ok(inserted.len() as u64)
    }
}
