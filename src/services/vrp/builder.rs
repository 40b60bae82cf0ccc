//! Builds a [`VrpProblem`] and its backing point list from domain entities.
//!
//! Every consumer that needs a solve — `OptimizationCoordinator`,
//! `TempAssignmentService`, `DailyRouteMaterializer` — goes through this so
//! the index bookkeeping (depot pairs first, then stops) lives in one place.

use crate::types::{Coordinates, Customer, Tech};

use super::{StopTimeWindow, VrpProblem, VrpStop, VrpVehicle};

/// One vehicle type per tech, depot pair pushed first; customers without
/// coordinates are silently skipped (callers are expected to have already
/// filtered on `Customer::coordinates().is_some()` and surfaced a warning).
pub fn build_fleet_problem(techs: &[Tech], customers: &[Customer]) -> (VrpProblem, Vec<Coordinates>) {
    let mut points = Vec::with_capacity(techs.len() * 2 + customers.len());
    let mut vehicles = Vec::with_capacity(techs.len());

    for tech in techs {
        let start_idx = points.len();
        points.push(tech.start());
        let end_idx = points.len();
        points.push(tech.end());

        vehicles.push(VrpVehicle {
            vehicle_id: tech.id.to_string(),
            tech_id: tech.id,
            tech_name: tech.name.clone(),
            tech_color: tech.color.clone(),
            start_idx,
            end_idx,
            capacity: tech.capacity(),
            shift_start: tech.working_hours_start,
            shift_end: tech.working_hours_end,
        });
    }

    let mut stops = Vec::with_capacity(customers.len());
    for customer in customers {
        let Some(coords) = customer.coordinates() else { continue };
        let location_idx = points.len();
        points.push(coords);

        let time_window = match (customer.time_window_start, customer.time_window_end) {
            (Some(start), Some(end)) => Some(StopTimeWindow { start, end, is_hard: true }),
            _ => None,
        };

        stops.push(VrpStop {
            id: customer.id.to_string(),
            customer_id: customer.id,
            customer_name: customer.display_name.clone(),
            location_idx,
            service_duration_minutes: customer.effective_service_min().max(0) as u32,
            time_window,
            priority: 1,
        });
    }

    (VrpProblem { vehicles, stops }, points)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use uuid::Uuid;

    use super::*;
    use crate::types::{CustomerStatus, ServiceType};

    fn tech() -> Tech {
        Tech {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Alex".to_string(),
            color: "#3498db".to_string(),
            start_latitude: 37.0,
            start_longitude: -121.0,
            end_latitude: 37.0,
            end_longitude: -121.0,
            working_hours_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            working_hours_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            max_stops_per_day: 10,
            efficiency_multiplier: 1.0,
            is_active: true,
        }
    }

    fn customer(lat: Option<f64>, lng: Option<f64>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            display_name: "Jane".to_string(),
            address: "1 Main St, Springfield".to_string(),
            latitude: lat,
            longitude: lng,
            service_type: ServiceType::Residential,
            visit_duration_min: 20,
            difficulty: 1,
            primary_day: "monday".to_string(),
            days_per_week: 1,
            schedule_pattern: None,
            locked: false,
            time_window_start: None,
            time_window_end: None,
            assigned_tech_id: None,
            is_active: true,
            status: CustomerStatus::Active,
        }
    }

    #[test]
    fn depot_pairs_come_before_stops() {
        let (problem, points) = build_fleet_problem(&[tech()], &[customer(Some(1.0), Some(2.0))]);
        assert_eq!(problem.vehicles[0].start_idx, 0);
        assert_eq!(problem.vehicles[0].end_idx, 1);
        assert_eq!(problem.stops[0].location_idx, 2);
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn customers_without_coordinates_are_skipped() {
        let (problem, points) = build_fleet_problem(&[tech()], &[customer(None, None)]);
        assert!(problem.stops.is_empty());
        assert_eq!(points.len(), 2);
    }
}
