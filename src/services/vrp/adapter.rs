//! Builds vrp-pragmatic problem/matrix inputs from a [`VrpProblem`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use vrp_pragmatic::format::problem::Matrix;

use crate::services::matrix::DistanceTimeMatrices;
use super::{SolverConfig, StopTimeWindow, VrpProblem};

pub const DEFAULT_PROFILE: &str = "car";

/// Per-vehicle max cumulative time, in minutes (8h workday).
const MAX_SHIFT_MINUTES: i64 = 480;
/// Per-vehicle max cumulative distance, in meters.
const MAX_SHIFT_DISTANCE_M: i64 = 200_000;

/// Assemble a full vrp-pragmatic problem document for the whole fleet.
pub fn build_pragmatic_problem(problem: &VrpProblem, date: NaiveDate, config: &SolverConfig) -> Value {
    let jobs: Vec<Value> = problem
        .stops
        .iter()
        .map(|stop| {
            let place = json!({
                "location": { "index": stop.location_idx },
                "duration": (stop.service_duration_minutes as i64) * 60,
            });

            let place = match &stop.time_window {
                Some(window) => add_time_window(place, date, window),
                None => place,
            };

            json!({
                "id": stop.id,
                "services": [{ "places": [place] }],
                "priority": stop.priority,
            })
        })
        .collect();

    let vehicles: Vec<Value> = problem
        .vehicles
        .iter()
        .map(|vehicle| {
            json!({
                "typeId": vehicle.vehicle_id,
                "vehicleIds": [vehicle.vehicle_id],
                "profile": { "matrix": DEFAULT_PROFILE },
                "costs": {
                    "fixed": 0.0,
                    "distance": 1.0,
                    "time": config.span_cost_coefficient,
                },
                "shifts": [{
                    "start": {
                        "earliest": format_rfc3339(date, vehicle.shift_start),
                        "location": { "index": vehicle.start_idx },
                    },
                    "end": {
                        "latest": format_rfc3339(date, vehicle.shift_end),
                        "location": { "index": vehicle.end_idx },
                    },
                }],
                "capacity": [vehicle.capacity],
                "limits": {
                    "shiftTime": MAX_SHIFT_MINUTES * 60,
                    "maxDistance": MAX_SHIFT_DISTANCE_M,
                },
            })
        })
        .collect();

    json!({
        "plan": { "jobs": jobs },
        "fleet": {
            "vehicles": vehicles,
            "profiles": [{ "name": DEFAULT_PROFILE }],
        },
    })
}

/// Flatten distance/time matrices to vrp-pragmatic's row-major `Matrix` shape.
pub fn build_pragmatic_matrix(matrices: &DistanceTimeMatrices, profile: &str) -> Matrix {
    let size = matrices.size;
    let mut travel_times = Vec::with_capacity(size * size);
    let mut distances = Vec::with_capacity(size * size);

    for i in 0..size {
        for j in 0..size {
            travel_times.push(matrices.duration(i, j) as i64);
            distances.push(matrices.distance(i, j) as i64);
        }
    }

    Matrix { profile: Some(profile.to_string()), timestamp: None, travel_times, distances, error_codes: None }
}

fn add_time_window(base: Value, date: NaiveDate, window: &StopTimeWindow) -> Value {
    let start = format_rfc3339(date, window.start);
    let end = format_rfc3339(date, window.end);
    json!({
        "location": base["location"].clone(),
        "duration": base["duration"].clone(),
        "times": [[start, end]],
    })
}

fn format_rfc3339(date: NaiveDate, time: NaiveTime) -> String {
    let naive = NaiveDateTime::new(date, time);
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vrp_pragmatic::format::problem::Problem;

    use super::super::{VrpStop, VrpVehicle};

    fn two_vehicle_problem() -> VrpProblem {
        VrpProblem {
            vehicles: vec![
                VrpVehicle {
                    vehicle_id: "tech-a".to_string(),
                    tech_id: Uuid::new_v4(),
                    tech_name: "Tech A".to_string(),
                    tech_color: "#ff0000".to_string(),
                    start_idx: 0,
                    end_idx: 0,
                    capacity: 20,
                    shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                    shift_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                },
                VrpVehicle {
                    vehicle_id: "tech-b".to_string(),
                    tech_id: Uuid::new_v4(),
                    tech_name: "Tech B".to_string(),
                    tech_color: "#00ff00".to_string(),
                    start_idx: 1,
                    end_idx: 1,
                    capacity: 15,
                    shift_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    shift_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
                },
            ],
            stops: vec![
                VrpStop {
                    id: "stop-1".to_string(),
                    customer_id: Uuid::new_v4(),
                    customer_name: "Customer A".to_string(),
                    location_idx: 2,
                    service_duration_minutes: 30,
                    time_window: Some(StopTimeWindow {
                        start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                        end: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                        is_hard: true,
                    }),
                    priority: 1,
                },
                VrpStop {
                    id: "stop-2".to_string(),
                    customer_id: Uuid::new_v4(),
                    customer_name: "Customer B".to_string(),
                    location_idx: 3,
                    service_duration_minutes: 20,
                    time_window: None,
                    priority: 1,
                },
            ],
        }
    }

    #[test]
    fn build_pragmatic_problem_contains_all_vehicles_and_jobs() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let problem = two_vehicle_problem();

        let json = build_pragmatic_problem(&problem, date, &SolverConfig::quick());

        let jobs = json["plan"]["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        let vehicles = json["fleet"]["vehicles"].as_array().unwrap();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0]["shifts"][0]["start"]["location"]["index"], 0);
        assert_eq!(vehicles[1]["shifts"][0]["start"]["location"]["index"], 1);
    }

    #[test]
    fn build_pragmatic_problem_applies_span_cost_coefficient() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let problem = two_vehicle_problem();

        let json = build_pragmatic_problem(&problem, date, &SolverConfig::quick());
        assert_eq!(json["fleet"]["vehicles"][0]["costs"]["time"], 5000.0);
        assert_eq!(json["fleet"]["vehicles"][0]["costs"]["distance"], 1.0);
    }

    #[test]
    fn build_pragmatic_problem_sets_shift_limits() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let problem = two_vehicle_problem();

        let json = build_pragmatic_problem(&problem, date, &SolverConfig::quick());
        assert_eq!(json["fleet"]["vehicles"][0]["limits"]["shiftTime"], 480 * 60);
        assert_eq!(json["fleet"]["vehicles"][0]["limits"]["maxDistance"], 200_000);
    }

    #[test]
    fn build_pragmatic_problem_encodes_time_window() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let problem = two_vehicle_problem();

        let json = build_pragmatic_problem(&problem, date, &SolverConfig::quick());
        let place = &json["plan"]["jobs"][0]["services"][0]["places"][0];
        let times = place["times"].as_array().unwrap();
        assert!(times[0][0].as_str().unwrap().starts_with("2026-01-26T10:00:00Z"));
    }

    #[test]
    fn build_pragmatic_problem_is_valid_for_deserialize() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let problem = two_vehicle_problem();

        let json = build_pragmatic_problem(&problem, date, &SolverConfig::quick());
        let parsed: Problem = serde_json::from_value(json).unwrap();

        assert_eq!(parsed.plan.jobs.len(), 2);
        assert_eq!(parsed.fleet.vehicles.len(), 2);
    }

    #[test]
    fn build_pragmatic_matrix_flattens_row_major() {
        let matrices = DistanceTimeMatrices {
            distances_m: vec![vec![0, 5], vec![7, 0]],
            durations_min: vec![vec![0, 10], vec![20, 0]],
            size: 2,
            source: "test",
        };

        let matrix = build_pragmatic_matrix(&matrices, "car");

        assert_eq!(matrix.distances, vec![0, 5, 7, 0]);
        assert_eq!(matrix.travel_times, vec![0, 10, 20, 0]);
        assert_eq!(matrix.profile.as_deref(), Some("car"));
    }
}
