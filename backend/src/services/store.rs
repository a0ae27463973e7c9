//! Collaborator seams of the session generator.
//!
//! The generator only talks to storage through these traits; the Postgres
//! implementations live next to it in `schedules`, `assignments`, `sessions`
//! and `holidays`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    assignment::AssignmentSnapshot, schedule::ScheduleWithRules, session::NewSession,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection-level failure. Always fatal to a generation run.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Query(e.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("assignment {0} not found")]
    NotFound(Uuid),
    #[error("assignment {0} is inactive")]
    Inactive(Uuid),
    #[error("assignment {assignment_id} does not belong to tenant {tenant_id}")]
    ScopeViolation { assignment_id: Uuid, tenant_id: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read access to schedule headers and their live rules.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// `None` when the schedule does not exist for this tenant or is soft-deleted.
    /// Rules come back in definition order.
    async fn load_schedule(
        &self,
        tenant_id: Uuid,
        schedule_id: Uuid,
    ) -> Result<Option<ScheduleWithRules>, StoreError>;
}

/// The assignment directory.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn snapshot(
        &self,
        tenant_id: Uuid,
        assignment_ref: Uuid,
    ) -> Result<AssignmentSnapshot, SnapshotError>;
}

/// Append-only session writes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts `rows` as one atomic statement, dropping any row that collides
    /// with a live session on the uniqueness or overlap constraints.
    /// Returns how many rows were actually inserted.
    async fn insert_skipping_conflicts(&self, rows: &[NewSession]) -> Result<u64, StoreError>;
}

/// Blacked-out dates (holidays) for a schedule's validity range.
#[async_trait]
pub trait CalendarExclusions: Send + Sync {
    async fn excluded_dates(
        &self,
        tenant_id: Uuid,
        schedule_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, StoreError>;
}

/// Used when no exclusion source is wired in.
pub struct NoExclusions;

#[async_trait]
impl CalendarExclusions for NoExclusions {
    async fn excluded_dates(
        &self,
        _tenant_id: Uuid,
        _schedule_id: Uuid,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        Ok(BTreeSet::new())
    }
}
