use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assignment::AssignmentSnapshot;

/// Lifecycle of an attendance session row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Open,
    Closed,
    Canceled,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
            SessionStatus::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(SessionStatus::Open),
            "closed" => Ok(SessionStatus::Closed),
            "canceled" | "cancelled" => Ok(SessionStatus::Canceled),
            _ => Err(anyhow::anyhow!("Unknown session status: {s}")),
        }
    }
}

/// A session row proposed by the generator, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSession {
    pub tenant_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub rule_id: Option<Uuid>,
    pub session_date: NaiveDate,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub snapshot: AssignmentSnapshot,
}

impl NewSession {
    pub fn teacher_id(&self) -> Uuid {
        self.snapshot.teacher_id
    }

    pub fn section_id(&self) -> Uuid {
        self.snapshot.section_id
    }

    pub fn room_id(&self) -> Option<Uuid> {
        self.snapshot.room_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_both_spellings_of_canceled() {
        assert_eq!("canceled".parse::<SessionStatus>().unwrap(), SessionStatus::Canceled);
        assert_eq!("cancelled".parse::<SessionStatus>().unwrap(), SessionStatus::Canceled);
        assert_eq!("open".parse::<SessionStatus>().unwrap(), SessionStatus::Open);
        assert!("pending".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn status_display_matches_database_labels() {
        assert_eq!(SessionStatus::Open.to_string(), "open");
        assert_eq!(SessionStatus::Closed.to_string(), "closed");
    }
}
