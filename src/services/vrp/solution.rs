//! Solver output: one planned route per vehicle, plus any unassigned stops.

use chrono::NaiveTime;
use uuid::Uuid;

/// Full-fleet solution for one day.
#[derive(Debug, Clone)]
pub struct RouteSolution {
    pub vehicle_routes: Vec<VehicleRoute>,
    /// Stop ids that could not be scheduled by any vehicle.
    pub unassigned: Vec<String>,
    pub warnings: Vec<RouteWarning>,
    pub algorithm: String,
    pub solve_time_ms: u64,
    pub solver_log: Vec<String>,
}

/// One vehicle's ordered stops for the day.
#[derive(Debug, Clone)]
pub struct VehicleRoute {
    pub vehicle_id: String,
    pub stops: Vec<PlannedStop>,
    pub total_distance_meters: u64,
    pub total_duration_seconds: u64,
}

/// A planned stop in a vehicle's route.
#[derive(Debug, Clone)]
pub struct PlannedStop {
    pub stop_id: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    /// Order in the route (1-based).
    pub order: u32,
    pub arrival_time: NaiveTime,
    pub departure_time: NaiveTime,
}

#[derive(Debug, Clone)]
pub struct RouteWarning {
    pub stop_id: Option<String>,
    pub warning_type: String,
    pub message: String,
}

impl RouteSolution {
    pub fn empty() -> Self {
        Self {
            vehicle_routes: vec![],
            unassigned: vec![],
            warnings: vec![],
            algorithm: "none".to_string(),
            solve_time_ms: 0,
            solver_log: vec![],
        }
    }

    pub fn total_distance_meters(&self) -> u64 {
        self.vehicle_routes.iter().map(|r| r.total_distance_meters).sum()
    }

    pub fn total_stops(&self) -> usize {
        self.vehicle_routes.iter().map(|r| r.stops.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_solution_has_no_routes() {
        let solution = RouteSolution::empty();
        assert!(solution.vehicle_routes.is_empty());
        assert_eq!(solution.total_distance_meters(), 0);
    }

    #[test]
    fn total_distance_sums_across_vehicles() {
        let solution = RouteSolution {
            vehicle_routes: vec![
                VehicleRoute { vehicle_id: "a".to_string(), stops: vec![], total_distance_meters: 1000, total_duration_seconds: 60 },
                VehicleRoute { vehicle_id: "b".to_string(), stops: vec![], total_distance_meters: 2000, total_duration_seconds: 120 },
            ],
            unassigned: vec![],
            warnings: vec![],
            algorithm: "test".to_string(),
            solve_time_ms: 0,
            solver_log: vec![],
        };
        assert_eq!(solution.total_distance_meters(), 3000);
    }
}
