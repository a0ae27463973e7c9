//! Materializes recurrence rules into attendance sessions.
//!
//! One run walks the schedule's validity range day by day, asks the matcher
//! about every surviving rule, and writes the candidates in chunks through an
//! insert that silently drops rows colliding with live sessions. Re-running a
//! schedule is therefore a no-op for dates that already have their sessions.
//! Concurrent runs rely on the storage constraints alone; no lock is taken.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    models::{
        assignment::AssignmentSnapshot,
        generation::{GenerationOptions, GenerationResult},
        schedule::{RecurrenceRule, Schedule, ScheduleWithRules},
        session::{NewSession, SessionStatus},
    },
    services::{
        assignments::PgAssignmentDirectory,
        holidays::PgHolidayCalendar,
        metrics,
        recurrence,
        schedules::PgScheduleStore,
        sessions::PgSessionStore,
        store::{
            CalendarExclusions, NoExclusions, ScheduleStore, SessionStore, SnapshotError,
            SnapshotProvider, StoreError,
        },
    },
};

/// Keeps one chunk's bind parameters (11 per row) under the Postgres limit of 65535.
pub const MAX_BATCH_SIZE: usize = 5000;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("schedule {0} not found")]
    NotFound(Uuid),
    #[error("invalid validity range: end {end} precedes start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),
    #[error("invalid generation options: {0}")]
    InvalidOptions(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("generation cancelled")]
    Cancelled,
}

/// Fallbacks for options a caller leaves unset.
#[derive(Debug, Clone, Copy)]
pub struct GenerationDefaults {
    pub timezone: Tz,
    pub batch_size: usize,
    pub attendance_status: SessionStatus,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            batch_size: 500,
            attendance_status: SessionStatus::Open,
        }
    }
}

impl GenerationDefaults {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            timezone: parse_timezone(&config.default_timezone)?,
            batch_size: config.generation_batch_size,
            attendance_status: config.default_attendance_status,
        })
    }
}

pub struct SessionGenerator {
    schedules: Arc<dyn ScheduleStore>,
    directory: Arc<dyn SnapshotProvider>,
    sessions: Arc<dyn SessionStore>,
    exclusions: Arc<dyn CalendarExclusions>,
    defaults: GenerationDefaults,
}

impl SessionGenerator {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        directory: Arc<dyn SnapshotProvider>,
        sessions: Arc<dyn SessionStore>,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            schedules,
            directory,
            sessions,
            exclusions: Arc::new(NoExclusions),
            defaults,
        }
    }

    pub fn with_exclusions(mut self, exclusions: Arc<dyn CalendarExclusions>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Generator wired to the Postgres stores, with holidays as exclusions.
    pub fn postgres(pool: PgPool, defaults: GenerationDefaults) -> Self {
        Self::new(
            Arc::new(PgScheduleStore::new(pool.clone())),
            Arc::new(PgAssignmentDirectory::new(pool.clone())),
            Arc::new(PgSessionStore::new(pool.clone())),
            defaults,
        )
        .with_exclusions(Arc::new(PgHolidayCalendar::new(pool)))
    }

    /// Materialize every session the schedule's rules fire on.
    ///
    /// Rules whose assignment cannot be resolved are skipped and reported in
    /// `warnings`; candidates rejected by the storage constraints are counted
    /// in `skipped`. Cancellation is honored before each assignment lookup and
    /// before each insert chunk; chunks already written stay written.
    pub async fn generate_for_schedule(
        &self,
        tenant_id: Uuid,
        schedule_id: Uuid,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        let tenant = tenant_id.to_string();
        let outcome = self.run(tenant_id, schedule_id, options, cancel).await;
        match &outcome {
            Ok(result) => metrics::record_run(
                &tenant,
                result.created,
                result.skipped,
                result.warnings.len(),
            ),
            Err(e) => {
                warn!("Generation failed for schedule {schedule_id} (tenant {tenant}): {e}");
                metrics::record_failure(&tenant);
            }
        }
        outcome
    }

    async fn run(
        &self,
        tenant_id: Uuid,
        schedule_id: Uuid,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        let batch_size = self.batch_size(options)?;
        let requested_tz = options
            .timezone
            .as_deref()
            .map(parse_timezone)
            .transpose()?;

        let ScheduleWithRules { schedule, rules } = self
            .schedules
            .load_schedule(tenant_id, schedule_id)
            .await?
            .filter(|loaded| loaded.schedule.is_live())
            .ok_or(GenerationError::NotFound(schedule_id))?;

        if schedule.end_date < schedule.start_date {
            return Err(GenerationError::InvalidRange {
                start: schedule.start_date,
                end: schedule.end_date,
            });
        }

        let tz = match (requested_tz, schedule.timezone.as_deref()) {
            (Some(tz), _) => tz,
            (None, Some(name)) => parse_timezone(name).unwrap_or_else(|_| {
                warn!(
                    "Tenant {} has unknown timezone '{}', using {}",
                    tenant_id, name, self.defaults.timezone
                );
                self.defaults.timezone
            }),
            (None, None) => self.defaults.timezone,
        };
        let status = options
            .default_attendance_status
            .unwrap_or(self.defaults.attendance_status);

        let mut warnings = Vec::new();
        let active = self
            .resolve_rules(tenant_id, &rules, options, cancel, &mut warnings)
            .await?;

        let excluded = self
            .exclusions
            .excluded_dates(tenant_id, schedule.id, schedule.start_date, schedule.end_date)
            .await?;

        let candidates = build_candidates(&schedule, &active, &excluded, tz, status);

        let mut created = 0u64;
        for (index, chunk) in candidates.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    "Generation cancelled for schedule {} after {} chunk(s), {} session(s) created",
                    schedule.id, index, created
                );
                return Err(GenerationError::Cancelled);
            }
            let inserted = self.sessions.insert_skipping_conflicts(chunk).await?;
            debug!(
                "Generation chunk {} for schedule {}: {}/{} inserted",
                index + 1,
                schedule.id,
                inserted,
                chunk.len()
            );
            created += inserted;
        }

        let total = candidates.len() as u64;
        let result = GenerationResult {
            created,
            candidates: total,
            skipped: total.saturating_sub(created),
            warnings,
        };
        info!(
            "Generated sessions for schedule {} (tenant {}): {} candidate(s), {} created, {} skipped, {} warning(s)",
            schedule.id,
            tenant_id,
            result.candidates,
            result.created,
            result.skipped,
            result.warnings.len()
        );
        Ok(result)
    }

    fn batch_size(&self, options: &GenerationOptions) -> Result<usize, GenerationError> {
        match options.batch_size.unwrap_or(self.defaults.batch_size) {
            0 => Err(GenerationError::InvalidOptions(
                "batch_size must be at least 1".into(),
            )),
            n => Ok(n.min(MAX_BATCH_SIZE)),
        }
    }

    /// Pair each usable rule with its assignment snapshot, looking each
    /// distinct assignment up once.
    async fn resolve_rules<'r>(
        &self,
        tenant_id: Uuid,
        rules: &'r [RecurrenceRule],
        options: &GenerationOptions,
        cancel: &CancellationToken,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<(&'r RecurrenceRule, AssignmentSnapshot)>, GenerationError> {
        let mut cache: HashMap<Uuid, Result<AssignmentSnapshot, String>> = HashMap::new();
        let mut active = Vec::with_capacity(rules.len());

        for rule in rules {
            if rule.start_time >= rule.end_time {
                warnings.push(format!(
                    "rule {}: start time {} is not before end time {}",
                    rule.id, rule.start_time, rule.end_time
                ));
                continue;
            }

            let Some(assignment) = rule.assignment_id.or(options.default_assignment_ref) else {
                warnings.push(format!(
                    "rule {}: no assignment and no default assignment",
                    rule.id
                ));
                continue;
            };

            if !cache.contains_key(&assignment) {
                if cancel.is_cancelled() {
                    return Err(GenerationError::Cancelled);
                }
                let resolved = match self.directory.snapshot(tenant_id, assignment).await {
                    Ok(snapshot) => Ok(snapshot),
                    Err(SnapshotError::Store(e)) => return Err(e.into()),
                    Err(e) => Err(e.to_string()),
                };
                cache.insert(assignment, resolved);
            }

            match cache.get(&assignment) {
                Some(Ok(snapshot)) => active.push((rule, snapshot.clone())),
                Some(Err(reason)) => {
                    warn!("Skipping rule {} of schedule {}: {}", rule.id, rule.schedule_id, reason);
                    warnings.push(format!("rule {}: {}", rule.id, reason));
                }
                None => {}
            }
        }

        Ok(active)
    }
}

/// Candidates in ascending date order, then rule order within a date. Two
/// rules firing on the same date both produce a row; storage decides which
/// survives when they collide.
fn build_candidates(
    schedule: &Schedule,
    rules: &[(&RecurrenceRule, AssignmentSnapshot)],
    excluded: &BTreeSet<NaiveDate>,
    tz: Tz,
    status: SessionStatus,
) -> Vec<NewSession> {
    let mut candidates = Vec::new();
    let dates = schedule
        .start_date
        .iter_days()
        .take_while(|date| *date <= schedule.end_date);

    for date in dates {
        if excluded.contains(&date) {
            continue;
        }
        for (rule, snapshot) in rules {
            if !recurrence::matches(date, schedule.start_date, &rule.pattern) {
                continue;
            }
            candidates.push(NewSession {
                tenant_id: schedule.tenant_id,
                schedule_id: Some(schedule.id),
                rule_id: Some(rule.id),
                session_date: date,
                starts_at: Some(local_instant(date, rule.start_time, tz)),
                ends_at: Some(local_instant(date, rule.end_time, tz)),
                status,
                snapshot: snapshot.clone(),
            });
        }
    }
    candidates
}

pub fn parse_timezone(name: &str) -> Result<Tz, GenerationError> {
    name.parse::<Tz>()
        .map_err(|_| GenerationError::InvalidTimezone(name.to_string()))
}

/// Wall-clock `time` on `date` in `tz`, as UTC. Ambiguous times take the
/// earlier instant; times inside a DST gap move forward one hour.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}
