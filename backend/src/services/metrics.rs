use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    pub static ref SESSIONS_GENERATED_COUNTER: CounterVec = register_counter_vec!(
        "sessions_generated_total",
        "Attendance sessions inserted by the generator, per tenant",
        &["tenant"]
    ).unwrap();

    pub static ref SESSIONS_SKIPPED_COUNTER: CounterVec = register_counter_vec!(
        "sessions_skipped_total",
        "Generated candidates dropped by the uniqueness/overlap constraints, per tenant",
        &["tenant"]
    ).unwrap();

    pub static ref GENERATION_RUNS_COUNTER: CounterVec = register_counter_vec!(
        "generation_runs_total",
        "Generation runs per tenant and outcome (ok, partial, failed)",
        &["tenant", "outcome"]
    ).unwrap();

    pub static ref RULE_WARNINGS_COUNTER: CounterVec = register_counter_vec!(
        "generation_rule_warnings_total",
        "Rules skipped during generation because their assignment could not be resolved",
        &["tenant"]
    ).unwrap();
}

/// Record a completed run.
pub fn record_run(tenant: &str, created: u64, skipped: u64, warnings: usize) {
    SESSIONS_GENERATED_COUNTER
        .with_label_values(&[tenant])
        .inc_by(created as f64);
    SESSIONS_SKIPPED_COUNTER
        .with_label_values(&[tenant])
        .inc_by(skipped as f64);
    RULE_WARNINGS_COUNTER
        .with_label_values(&[tenant])
        .inc_by(warnings as f64);
    let outcome = if warnings == 0 { "ok" } else { "partial" };
    GENERATION_RUNS_COUNTER
        .with_label_values(&[tenant, outcome])
        .inc();
}

pub fn record_failure(tenant: &str) {
    GENERATION_RUNS_COUNTER
        .with_label_values(&[tenant, "failed"])
        .inc();
}
