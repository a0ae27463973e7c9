//! Materialize attendance sessions for a tenant's schedules.
//! Safe to re-run: sessions that already exist are skipped.
//!
//! Usage: generate-sessions --tenant SLUG [--schedule UUID] [--timezone TZ] [--batch-size N] [--status S]
//!   --schedule UUID : Generate only this schedule (all live schedules if not specified)

use clap::Parser;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use campus_sessions_api::{
    config::Config,
    db,
    models::{generation::GenerationOptions, session::SessionStatus},
    services::{
        generator::{GenerationDefaults, SessionGenerator},
        schedules::PgScheduleStore,
    },
};

#[derive(Parser)]
#[command(name = "generate-sessions", about = "Generate attendance sessions from recurring schedules")]
struct Args {
    /// Tenant slug
    #[arg(long)]
    tenant: String,

    /// Schedule to generate (optional, all live schedules if not specified)
    #[arg(long)]
    schedule: Option<Uuid>,

    /// IANA timezone overriding the tenant's
    #[arg(long)]
    timezone: Option<String>,

    /// Max sessions per insert statement
    #[arg(long)]
    batch_size: Option<usize>,

    /// Attendance status for new sessions (open, closed, canceled)
    #[arg(long)]
    status: Option<SessionStatus>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, 5).await?;

    let tenant_id = db::tenant_id_for_slug(&pool, &args.tenant)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Tenant '{}' not found or inactive", args.tenant))?;

    let generator = SessionGenerator::postgres(pool.clone(), GenerationDefaults::from_config(&config)?);
    let options = GenerationOptions {
        timezone: args.timezone,
        default_assignment_ref: None,
        default_attendance_status: args.status,
        batch_size: args.batch_size,
    };

    let schedule_ids = match args.schedule {
        Some(id) => vec![id],
        None => {
            let today = chrono::Utc::now().date_naive();
            PgScheduleStore::new(pool.clone()).list_live_ids(tenant_id, today).await?
        }
    };

    tracing::info!("Generating sessions for {} schedule(s) in '{}'", schedule_ids.len(), args.tenant);

    let cancel = CancellationToken::new();
    let mut failures = 0usize;
    for schedule_id in schedule_ids {
        match generator
            .generate_for_schedule(tenant_id, schedule_id, &options, &cancel)
            .await
        {
            Ok(result) => {
                tracing::info!(
                    "Schedule {}: {} created, {} skipped of {} candidates",
                    schedule_id,
                    result.created,
                    result.skipped,
                    result.candidates
                );
                for warning in &result.warnings {
                    tracing::warn!("Schedule {}: {}", schedule_id, warning);
                }
            }
            Err(e) => {
                failures += 1;
                tracing::error!("Error generating schedule {}: {}", schedule_id, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} schedule(s) failed to generate", failures);
    }
    tracing::info!("Session generation completed");
    Ok(())
}
