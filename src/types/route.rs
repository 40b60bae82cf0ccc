//! Owned routing entities: `TechRoute` and the request/result shapes for
//! `optimize`, `save_routes`, `get_day_routes`, `reorder_stops`, `move_stop`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::customer::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TechRoute {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tech_id: Uuid,
    pub service_day: String,
    pub route_date: NaiveDate,
    pub stop_sequence: sqlx::types::Json<Vec<Uuid>>,
    pub total_distance_miles: f64,
    pub total_duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeMode {
    Refine,
    FullPerDay,
    CrossDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedProfile {
    Quick,
    Thorough,
}

impl SpeedProfile {
    /// Wall-clock budget in seconds: 30s quick / 120s thorough.
    pub fn max_time_seconds(&self) -> u64 {
        match self {
            SpeedProfile::Quick => 30,
            SpeedProfile::Thorough => 120,
        }
    }

    /// Workload-balance span-cost coefficient: 5000 quick / 4000 thorough.
    pub fn span_cost_coefficient(&self) -> f64 {
        match self {
            SpeedProfile::Quick => 5000.0,
            SpeedProfile::Thorough => 4000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub mode: OptimizeMode,
    pub service_day: Option<String>,
    #[serde(default)]
    pub selected_tech_ids: Vec<Uuid>,
    #[serde(default)]
    pub unlocked_customer_ids: Vec<Uuid>,
    #[serde(default)]
    pub speed: Option<SpeedProfile>,
    #[serde(default)]
    pub include_unassigned: bool,
    #[serde(default)]
    pub include_pending: bool,
    #[serde(default)]
    pub include_saturday: bool,
    #[serde(default)]
    pub include_sunday: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStopView {
    pub customer_id: Uuid,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub sequence: u32,
    pub service_duration_min: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub tech_id: Uuid,
    pub tech_name: String,
    pub tech_color: String,
    pub service_day: String,
    pub start_location: Coordinates,
    pub end_location: Coordinates,
    pub stops: Vec<RouteStopView>,
    pub total_customers: u32,
    pub total_distance_miles: f64,
    pub total_duration_minutes: i32,
    pub matrix_source: String,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeSummary {
    pub total_routes: u32,
    pub total_customers: u32,
    pub skipped: Vec<Uuid>,
    pub failed_days: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResult {
    pub routes: Vec<OptimizedRoute>,
    pub summary: OptimizeSummary,
    pub message: Option<String>,
}

impl OptimizeResult {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            routes: vec![],
            summary: OptimizeSummary::default(),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRoutesRequest {
    pub service_day: String,
    pub routes: Vec<OptimizedRoute>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRoutesResult {
    pub saved_route_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDayRoutesRequest {
    pub service_day: String,
    pub route_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderStopsRequest {
    pub route_id: Uuid,
    pub stops: Vec<StopPosition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPosition {
    pub stop_id: Uuid,
    pub new_sequence: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveStopRequest {
    pub stop_id: Uuid,
    pub target_route_id: Uuid,
    pub insert_sequence: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDayRoutesRequest {
    pub service_day: String,
}
