//! Tech (field technician / vehicle) — read-only from the Core's perspective.
//!
//! Techs are owned and CRUD'd by an external collaborator; the Core only
//! reads them to build VRP vehicles and resolve route metadata.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::customer::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tech {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub working_hours_start: NaiveTime,
    pub working_hours_end: NaiveTime,
    pub max_stops_per_day: i32,
    pub efficiency_multiplier: f64,
    pub is_active: bool,
}

fn default_color() -> String {
    "#3498db".to_string()
}

impl Tech {
    pub fn start(&self) -> Coordinates {
        Coordinates { lat: self.start_latitude, lng: self.start_longitude }
    }

    pub fn end(&self) -> Coordinates {
        Coordinates { lat: self.end_latitude, lng: self.end_longitude }
    }

    /// `floor(max_stops_per_day * efficiency_multiplier)`, per the capacity-dimension contract.
    pub fn capacity(&self) -> u32 {
        ((self.max_stops_per_day as f64) * self.efficiency_multiplier).floor().max(0.0) as u32
    }

    /// Workday length in minutes; used to sanity-check the 480-minute time-dimension cap.
    pub fn working_hours_duration_minutes(&self) -> i64 {
        (self.working_hours_end - self.working_hours_start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tech {
        Tech {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Alex".to_string(),
            color: default_color(),
            start_latitude: 37.0,
            start_longitude: -121.0,
            end_latitude: 37.0,
            end_longitude: -121.0,
            working_hours_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            working_hours_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            max_stops_per_day: 10,
            efficiency_multiplier: 1.5,
            is_active: true,
        }
    }

    #[test]
    fn capacity_floors_the_product() {
        assert_eq!(sample().capacity(), 15);
    }

    #[test]
    fn working_hours_duration() {
        assert_eq!(sample().working_hours_duration_minutes(), 540);
    }

    #[test]
    fn start_end_coincide_when_depot_is_shared() {
        let tech = sample();
        assert_eq!(tech.start(), tech.end());
    }
}
