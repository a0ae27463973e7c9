use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::assignment::AssignmentSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "schedule_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Scheduled,
    Ongoing,
    Completed,
    Canceled,
}

/// Which firing weeks a rule keeps, counted from its first firing week.
/// The first firing week (adjusted index 0) is "odd".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "week_parity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WeekParity {
    #[default]
    All,
    Odd,
    Even,
}

/// Tenant-scoped schedule header. `timezone` is joined in from `tenants`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    pub is_active: bool,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// Soft-deleted rows never reach this type; inactive and canceled ones do.
    pub fn is_live(&self) -> bool {
        self.is_active && self.status != ScheduleStatus::Canceled
    }
}

/// The date-matching part of a rule, independent of times and assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RecurrencePattern {
    /// 1 = Monday .. 7 = Sunday
    pub day_of_week: i16,
    pub interval_weeks: i32,
    pub start_offset_weeks: i32,
    pub week_parity: WeekParity,
    /// Ordinal weeks of the month (1..=5); empty means unconstrained.
    pub weeks_of_month: Vec<i16>,
    pub last_week_of_month: bool,
}

impl RecurrencePattern {
    /// Every week on `day_of_week`, starting from the basis week.
    pub fn weekly(day_of_week: i16) -> Self {
        Self {
            day_of_week,
            interval_weeks: 1,
            start_offset_weeks: 0,
            week_parity: WeekParity::All,
            weeks_of_month: Vec::new(),
            last_week_of_month: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub schedule_id: Uuid,
    pub position: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub pattern: RecurrencePattern,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub assignment_id: Option<Uuid>,
    /// Copy captured when the rule was saved; generation always re-resolves.
    pub assignment_snapshot: Option<Json<AssignmentSnapshot>>,
}

/// A schedule header with its live rules in definition order.
#[derive(Debug, Clone)]
pub struct ScheduleWithRules {
    pub schedule: Schedule,
    pub rules: Vec<RecurrenceRule>,
}
