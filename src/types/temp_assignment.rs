//! Day-scoped temporary tech reassignment.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A temp assignment expires once its `assignment_date` is this many days old.
pub const TEMP_ASSIGNMENT_TTL_DAYS: i64 = 6;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TempAssignment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub tech_id: Uuid,
    pub service_day: String,
    pub assignment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl TempAssignment {
    /// `assignment_date < today - 6d`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.assignment_date < today - chrono::Duration::days(TEMP_ASSIGNMENT_TTL_DAYS)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTempAssignmentRequest {
    pub customer_id: Uuid,
    pub tech_id: Uuid,
    pub service_day: String,
    pub assignment_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(assignment_date: NaiveDate) -> TempAssignment {
        TempAssignment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            tech_id: Uuid::new_v4(),
            service_day: "monday".to_string(),
            assignment_date,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn not_expired_within_window() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let temp = sample(today - chrono::Duration::days(6));
        assert!(!temp.is_expired(today));
    }

    #[test]
    fn expired_past_window() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let temp = sample(today - chrono::Duration::days(7));
        assert!(temp.is_expired(today));
    }
}
