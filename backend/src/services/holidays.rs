use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::store::{CalendarExclusions, StoreError};

/// Tenant-wide holidays plus holidays attached to a single schedule.
pub struct PgHolidayCalendar {
    pool: PgPool,
}

impl PgHolidayCalendar {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarExclusions for PgHolidayCalendar {
    async fn excluded_dates(
        &self,
        tenant_id: Uuid,
        schedule_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        // Ranges are clipped to [start, end] in SQL.
        let ranges: Vec<(NaiveDate, NaiveDate)> = sqlx::query_as(
            "SELECT GREATEST(start_date, $3), LEAST(end_date, $4)
             FROM public.holidays
             WHERE tenant_id = $1
               AND (schedule_id IS NULL OR schedule_id = $2)
               AND deleted_at IS NULL
               AND start_date <= $4
               AND end_date >= $3",
        )
        .bind(tenant_id)
        .bind(schedule_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(expand_ranges(&ranges))
    }
}

fn expand_ranges(ranges: &[(NaiveDate, NaiveDate)]) -> BTreeSet<NaiveDate> {
    ranges
        .iter()
        .flat_map(|(from, to)| from.iter_days().take_while(move |d| d <= to))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn ranges_expand_inclusively_and_merge() {
        let dates = expand_ranges(&[(d(3, 28), d(4, 2)), (d(4, 1), d(4, 1)), (d(5, 1), d(5, 1))]);
        let expected: BTreeSet<NaiveDate> = [
            d(3, 28), d(3, 29), d(3, 30), d(3, 31), d(4, 1), d(4, 2), d(5, 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn inverted_range_yields_nothing() {
        assert!(expand_ranges(&[(d(4, 2), d(4, 1))]).is_empty());
    }
}
