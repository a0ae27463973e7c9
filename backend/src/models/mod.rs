pub mod assignment;
pub mod auth;
pub mod generation;
pub mod schedule;
pub mod session;
pub mod tenant;
pub mod user;
