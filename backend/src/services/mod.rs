pub mod assignments;
pub mod generator;
pub mod holidays;
pub mod metrics;
pub mod recurrence;
pub mod schedules;
pub mod sessions;
pub mod store;
