use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::schedule::{RecurrenceRule, Schedule, ScheduleWithRules},
    services::store::{ScheduleStore, StoreError},
};

/// Schedule headers and rules, read-only.
pub struct PgScheduleStore {
    pool: PgPool,
}

impl PgScheduleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ids of every live schedule of a tenant whose range has not ended before `from`.
    pub async fn list_live_ids(
        &self,
        tenant_id: Uuid,
        from: chrono::NaiveDate,
    ) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM public.schedules
             WHERE tenant_id = $1
               AND deleted_at IS NULL
               AND is_active = TRUE
               AND status <> 'canceled'
               AND end_date >= $2
             ORDER BY start_date, id",
        )
        .bind(tenant_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[async_trait]
impl ScheduleStore for PgScheduleStore {
    async fn load_schedule(
        &self,
        tenant_id: Uuid,
        schedule_id: Uuid,
    ) -> Result<Option<ScheduleWithRules>, StoreError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            "SELECT s.id, s.tenant_id, s.name, s.start_date, s.end_date, s.status,
                    s.is_active, t.timezone, s.created_at, s.updated_at
             FROM public.schedules s
             JOIN public.tenants t ON t.id = s.tenant_id
             WHERE s.id = $1 AND s.tenant_id = $2 AND s.deleted_at IS NULL",
        )
        .bind(schedule_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(schedule) = schedule else {
            return Ok(None);
        };

        let rules = sqlx::query_as::<_, RecurrenceRule>(
            "SELECT id, tenant_id, schedule_id, position,
                    day_of_week, interval_weeks, start_offset_weeks, week_parity,
                    weeks_of_month, last_week_of_month,
                    start_time, end_time, assignment_id, assignment_snapshot
             FROM public.schedule_rules
             WHERE schedule_id = $1 AND tenant_id = $2 AND deleted_at IS NULL
             ORDER BY position, created_at, id",
        )
        .bind(schedule_id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ScheduleWithRules { schedule, rules }))
    }
}
