//! VRP problem domain types: a fleet of vehicles, each with its own start/end
//! depot, visiting a shared pool of stops over a shared distance/time matrix.

use chrono::NaiveTime;
use uuid::Uuid;

use crate::services::matrix::DistanceTimeMatrices;

/// A single vehicle (tech) in the fleet, located by index into the shared matrix.
#[derive(Debug, Clone)]
pub struct VrpVehicle {
    pub vehicle_id: String,
    pub tech_id: Uuid,
    pub tech_name: String,
    pub tech_color: String,
    /// Index of the vehicle's start location in the shared location/matrix list.
    pub start_idx: usize,
    /// Index of the vehicle's end location; equal to `start_idx` for round trips.
    pub end_idx: usize,
    /// Max stops this vehicle may take in a shift.
    pub capacity: u32,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
}

/// A stop (customer visit) to be assigned to exactly one vehicle.
#[derive(Debug, Clone)]
pub struct VrpStop {
    pub id: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    /// Index of this stop's location in the shared location/matrix list.
    pub location_idx: usize,
    pub service_duration_minutes: u32,
    pub time_window: Option<StopTimeWindow>,
    pub priority: i32,
}

/// Time window for a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_hard: bool,
}

/// A whole day's VRP problem: a fleet plus the pool of stops shared across it.
#[derive(Debug, Clone)]
pub struct VrpProblem {
    pub vehicles: Vec<VrpVehicle>,
    pub stops: Vec<VrpStop>,
}

impl VrpProblem {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty() || self.vehicles.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn mock_matrices(n: usize) -> DistanceTimeMatrices {
    let mut distances = vec![vec![0u64; n]; n];
    let mut durations = vec![vec![0u64; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let diff = ((i as i64 - j as i64).abs() as u64) + 1;
                distances[i][j] = diff * 10_000;
                durations[i][j] = diff * 10;
            }
        }
    }
    DistanceTimeMatrices { distances_m: distances, durations_min: durations, size: n, source: "test" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: &str, start: usize, end: usize) -> VrpVehicle {
        VrpVehicle {
            vehicle_id: id.to_string(),
            tech_id: Uuid::new_v4(),
            tech_name: id.to_string(),
            tech_color: "#000000".to_string(),
            start_idx: start,
            end_idx: end,
            capacity: 20,
            shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            shift_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_with_no_vehicles() {
        let problem = VrpProblem { vehicles: vec![], stops: vec![] };
        assert!(problem.is_empty());
    }

    #[test]
    fn empty_with_no_stops() {
        let problem = VrpProblem { vehicles: vec![vehicle("v1", 0, 0)], stops: vec![] };
        assert!(problem.is_empty());
    }

    #[test]
    fn not_empty_with_vehicles_and_stops() {
        let problem = VrpProblem {
            vehicles: vec![vehicle("v1", 0, 0)],
            stops: vec![VrpStop {
                id: "s1".to_string(),
                customer_id: Uuid::new_v4(),
                customer_name: "Customer A".to_string(),
                location_idx: 1,
                service_duration_minutes: 20,
                time_window: None,
                priority: 1,
            }],
        };
        assert!(!problem.is_empty());
    }
}
