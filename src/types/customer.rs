//! Customer (service location) — read-only from the Core's perspective.
//!
//! Customer CRUD, geocoding, and status transitions belong to an external
//! collaborator; the Core reads the fields below to decide eligibility and
//! to build VRP jobs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::day::{parse_schedule_pattern, ServiceDay};

/// A geographic point, `(lat, lng)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Residential,
    Commercial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub display_name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub service_type: ServiceType,
    pub visit_duration_min: i32,
    pub difficulty: i32,
    pub primary_day: String,
    pub days_per_week: i32,
    pub schedule_pattern: Option<String>,
    pub locked: bool,
    pub time_window_start: Option<chrono::NaiveTime>,
    pub time_window_end: Option<chrono::NaiveTime>,
    pub assigned_tech_id: Option<Uuid>,
    pub is_active: bool,
    pub status: CustomerStatus,
}

impl Customer {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }

    /// `effective_service_min = visit_duration_min + 5 * max(0, difficulty - 1)`.
    pub fn effective_service_min(&self) -> i32 {
        self.visit_duration_min + 5 * (self.difficulty - 1).max(0)
    }

    /// `serves_on`: single-day customers match `primary_day` exactly; multi-day
    /// customers are driven by the two-letter codes in `schedule_pattern`.
    pub fn serves_on(&self, day: ServiceDay) -> bool {
        if self.days_per_week <= 1 {
            return ServiceDay::from_str_lower(&self.primary_day) == Some(day);
        }
        match &self.schedule_pattern {
            Some(pattern) => parse_schedule_pattern(pattern).contains(&day),
            None => ServiceDay::from_str_lower(&self.primary_day) == Some(day),
        }
    }

    pub fn eligible(&self, include_pending: bool) -> bool {
        match self.status {
            CustomerStatus::Active => self.is_active,
            CustomerStatus::Pending => include_pending,
            CustomerStatus::Inactive => false,
        }
    }

    /// Short two-part address used in materialized route stops (`street, city`).
    pub fn short_address(&self) -> String {
        self.address
            .split(',')
            .take(2)
            .collect::<Vec<_>>()
            .join(",")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(days_per_week: i32, primary_day: &str, pattern: Option<&str>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            display_name: "Jane Doe".to_string(),
            address: "123 Main St, Springfield, IL".to_string(),
            latitude: Some(37.01),
            longitude: Some(-121.01),
            service_type: ServiceType::Residential,
            visit_duration_min: 20,
            difficulty: 1,
            primary_day: primary_day.to_string(),
            days_per_week,
            schedule_pattern: pattern.map(str::to_string),
            locked: false,
            time_window_start: None,
            time_window_end: None,
            assigned_tech_id: None,
            is_active: true,
            status: CustomerStatus::Active,
        }
    }

    #[test]
    fn single_day_serves_only_primary_day() {
        let c = sample(1, "monday", None);
        assert!(c.serves_on(ServiceDay::Monday));
        assert!(!c.serves_on(ServiceDay::Tuesday));
    }

    #[test]
    fn multi_day_uses_schedule_pattern() {
        let c = sample(3, "monday", Some("Mo/We/Fr"));
        assert!(c.serves_on(ServiceDay::Monday));
        assert!(c.serves_on(ServiceDay::Wednesday));
        assert!(c.serves_on(ServiceDay::Friday));
        assert!(!c.serves_on(ServiceDay::Tuesday));
    }

    #[test]
    fn effective_service_min_scales_with_difficulty() {
        let mut c = sample(1, "monday", None);
        c.difficulty = 3;
        assert_eq!(c.effective_service_min(), 20 + 5 * 2);
    }

    #[test]
    fn no_coordinates_when_either_missing() {
        let mut c = sample(1, "monday", None);
        c.longitude = None;
        assert!(c.coordinates().is_none());
    }

    #[test]
    fn pending_excluded_unless_requested() {
        let mut c = sample(1, "monday", None);
        c.status = CustomerStatus::Pending;
        assert!(!c.eligible(false));
        assert!(c.eligible(true));
    }

    #[test]
    fn inactive_status_never_eligible() {
        let mut c = sample(1, "monday", None);
        c.status = CustomerStatus::Inactive;
        assert!(!c.eligible(true));
    }

    #[test]
    fn short_address_keeps_first_two_parts() {
        let c = sample(1, "monday", None);
        assert_eq!(c.short_address(), "123 Main St, Springfield");
    }
}
