//! Multi-vehicle VRP solver.
//!
//! Primary path is vrp-pragmatic's evolutionary/local-search engine; on any
//! backend failure, falls back to a deterministic multi-vehicle nearest
//! neighbor construction so `solve` never propagates a hard error for a
//! transient backend failure.

mod adapter;
mod builder;
mod config;
mod pragmatic;
mod problem;
mod solution;

pub use adapter::{build_pragmatic_matrix, build_pragmatic_problem, DEFAULT_PROFILE};
pub use builder::build_fleet_problem;
pub use config::SolverConfig;
pub use pragmatic::solve_pragmatic;
pub use problem::{StopTimeWindow, VrpProblem, VrpStop, VrpVehicle};
pub use solution::{PlannedStop, RouteSolution, RouteWarning, VehicleRoute};

use std::time::Instant;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::{debug, info, warn};

use crate::services::matrix::DistanceTimeMatrices;

pub struct VrpSolver {
    config: SolverConfig,
}

impl VrpSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn solve(
        &self,
        problem: &VrpProblem,
        matrices: &DistanceTimeMatrices,
        date: NaiveDate,
    ) -> Result<RouteSolution> {
        let started_at = Instant::now();

        if problem.is_empty() {
            debug!("no stops or vehicles to optimize, returning empty solution");
            let mut solution = RouteSolution::empty();
            solution.solve_time_ms = started_at.elapsed().as_millis() as u64;
            solution.solver_log = vec!["no_stops".to_string()];
            return Ok(solution);
        }

        if problem.stops.len() == 1 {
            debug!("single customer, skipping solve: zero drive time by contract");
            let mut solution = self.single_stop_shortcut(problem);
            solution.solve_time_ms = started_at.elapsed().as_millis() as u64;
            return Ok(solution);
        }

        info!(
            "solving VRP with {} vehicles, {} stops using vrp-pragmatic",
            problem.vehicles.len(),
            problem.stops.len(),
        );

        match solve_pragmatic(problem, matrices, date, &self.config) {
            Ok(mut solution) => {
                solution.solve_time_ms = started_at.elapsed().as_millis() as u64;

                let mut log = vec![
                    format!("algorithm=vrp-pragmatic time_ms={}", solution.solve_time_ms),
                    format!(
                        "vehicles={} stops={} unassigned={}",
                        solution.vehicle_routes.len(),
                        solution.total_stops(),
                        solution.unassigned.len()
                    ),
                ];
                log.extend(solution.solver_log.drain(..));
                solution.solver_log = log;

                info!(
                    "VRP solved with vrp-pragmatic: {} stops across {} vehicles, {:.1} km",
                    solution.total_stops(),
                    solution.vehicle_routes.len(),
                    solution.total_distance_meters() as f64 / 1000.0,
                );
                return Ok(solution);
            }
            Err(err) => {
                warn!("vrp-pragmatic failed, falling back to heuristic: {}", err);
                let mut solution = self.nearest_neighbor_fallback(problem, matrices, date);
                solution.solve_time_ms = started_at.elapsed().as_millis() as u64;
                solution.solver_log = vec![
                    format!("pragmatic_error={}", err),
                    format!("algorithm=heuristic time_ms={}", solution.solve_time_ms),
                    format!(
                        "vehicles={} stops={} unassigned={}",
                        solution.vehicle_routes.len(),
                        solution.total_stops(),
                        solution.unassigned.len()
                    ),
                ];
                solution.warnings.push(RouteWarning {
                    stop_id: None,
                    warning_type: "PRAGMATIC_FAILED".to_string(),
                    message: "vrp-pragmatic failed, used heuristic fallback".to_string(),
                });

                info!(
                    "VRP solved with heuristic fallback: {} stops, {:.1} km",
                    solution.total_stops(),
                    solution.total_distance_meters() as f64 / 1000.0,
                );
                Ok(solution)
            }
        }
    }

    /// A single stop needs no routing: assign it to the first vehicle with
    /// zero drive distance/duration, route cost is service time only. Every
    /// other vehicle gets an empty route.
    fn single_stop_shortcut(&self, problem: &VrpProblem) -> RouteSolution {
        let stop = &problem.stops[0];
        let service_seconds = stop.service_duration_minutes as u64 * 60;
        let arrival_time = problem.vehicles[0].shift_start;
        let departure_time = add_seconds_to_time(arrival_time, service_seconds as i64);

        let mut vehicle_routes = Vec::with_capacity(problem.vehicles.len());
        for (idx, vehicle) in problem.vehicles.iter().enumerate() {
            let stops = if idx == 0 {
                vec![PlannedStop {
                    stop_id: stop.id.clone(),
                    customer_id: stop.customer_id,
                    customer_name: stop.customer_name.clone(),
                    order: 1,
                    arrival_time,
                    departure_time,
                }]
            } else {
                vec![]
            };
            let total_duration_seconds = if idx == 0 { service_seconds } else { 0 };
            vehicle_routes.push(VehicleRoute {
                vehicle_id: vehicle.vehicle_id.clone(),
                stops,
                total_distance_meters: 0,
                total_duration_seconds,
            });
        }

        RouteSolution {
            vehicle_routes,
            unassigned: vec![],
            warnings: vec![],
            algorithm: "single_stop_shortcut".to_string(),
            solve_time_ms: 0,
            solver_log: vec!["single_stop_shortcut".to_string()],
        }
    }

    /// Deterministic greedy construction: repeatedly assign the closest
    /// (vehicle, stop) pair among vehicles still under capacity, until no
    /// stop can be placed.
    fn nearest_neighbor_fallback(
        &self,
        problem: &VrpProblem,
        matrices: &DistanceTimeMatrices,
        date: NaiveDate,
    ) -> RouteSolution {
        let vehicle_count = problem.vehicles.len();
        let mut current_pos: Vec<usize> = problem.vehicles.iter().map(|v| v.start_idx).collect();
        let mut loaded = vec![0u32; vehicle_count];
        let mut assignments: Vec<Vec<usize>> = vec![Vec::new(); vehicle_count];
        let mut visited = vec![false; problem.stops.len()];
        let mut remaining = problem.stops.len();

        while remaining > 0 {
            let mut best: Option<(usize, usize, u64)> = None;

            for (v_idx, vehicle) in problem.vehicles.iter().enumerate() {
                if loaded[v_idx] >= vehicle.capacity {
                    continue;
                }
                for (s_idx, stop) in problem.stops.iter().enumerate() {
                    if visited[s_idx] {
                        continue;
                    }
                    let dist = matrices.distance(current_pos[v_idx], stop.location_idx);
                    if best.map(|(_, _, d)| dist < d).unwrap_or(true) {
                        best = Some((v_idx, s_idx, dist));
                    }
                }
            }

            match best {
                Some((v_idx, s_idx, _)) => {
                    visited[s_idx] = true;
                    remaining -= 1;
                    loaded[v_idx] += 1;
                    current_pos[v_idx] = problem.stops[s_idx].location_idx;
                    assignments[v_idx].push(s_idx);
                }
                None => break,
            }
        }

        let unassigned: Vec<String> = problem
            .stops
            .iter()
            .enumerate()
            .filter(|(idx, _)| !visited[*idx])
            .map(|(_, stop)| stop.id.clone())
            .collect();

        let mut vehicle_routes = Vec::with_capacity(vehicle_count);
        for (v_idx, vehicle) in problem.vehicles.iter().enumerate() {
            vehicle_routes.push(self.build_vehicle_route(vehicle, &problem.stops, &assignments[v_idx], matrices));
        }
        let _ = date;

        let total_stops: usize = vehicle_routes.iter().map(|r| r.stops.len()).sum();
        RouteSolution {
            vehicle_routes,
            unassigned,
            warnings: vec![],
            algorithm: "heuristic".to_string(),
            solve_time_ms: 0,
            solver_log: vec![format!("assigned {} of {} stops", total_stops, problem.stops.len())],
        }
    }

    fn build_vehicle_route(
        &self,
        vehicle: &VrpVehicle,
        stops: &[VrpStop],
        ordered_indices: &[usize],
        matrices: &DistanceTimeMatrices,
    ) -> VehicleRoute {
        let mut planned_stops = Vec::new();
        let mut total_distance = 0u64;
        let mut total_duration = 0u64;
        let mut current_time = vehicle.shift_start;
        let mut prev_idx = vehicle.start_idx;

        for (order, &stop_idx) in ordered_indices.iter().enumerate() {
            let stop = &stops[stop_idx];

            let travel_distance = matrices.distance(prev_idx, stop.location_idx);
            let travel_duration = matrices.duration(prev_idx, stop.location_idx);
            total_distance += travel_distance;
            total_duration += travel_duration * 60;

            let arrival_time = add_seconds_to_time(current_time, travel_duration as i64 * 60);
            let service_seconds = stop.service_duration_minutes as i64 * 60;
            let departure_time = add_seconds_to_time(arrival_time, service_seconds);
            total_duration += service_seconds as u64;

            planned_stops.push(PlannedStop {
                stop_id: stop.id.clone(),
                customer_id: stop.customer_id,
                customer_name: stop.customer_name.clone(),
                order: (order + 1) as u32,
                arrival_time,
                departure_time,
            });

            current_time = departure_time;
            prev_idx = stop.location_idx;
        }

        if !ordered_indices.is_empty() {
            total_distance += matrices.distance(prev_idx, vehicle.end_idx);
            total_duration += matrices.duration(prev_idx, vehicle.end_idx) * 60;
        }

        VehicleRoute { vehicle_id: vehicle.vehicle_id.clone(), stops: planned_stops, total_distance_meters: total_distance, total_duration_seconds: total_duration }
    }
}

impl Default for VrpSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

fn add_seconds_to_time(time: NaiveTime, seconds: i64) -> NaiveTime {
    let total_seconds = time.num_seconds_from_midnight() as i64 + seconds;
    let wrapped = total_seconds.rem_euclid(86_400);
    NaiveTime::from_num_seconds_from_midnight_opt(wrapped as u32, 0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use problem::mock_matrices;
    use uuid::Uuid;

    fn vehicle(id: &str, start_idx: usize) -> VrpVehicle {
        VrpVehicle {
            vehicle_id: id.to_string(),
            tech_id: Uuid::new_v4(),
            tech_name: id.to_string(),
            tech_color: "#000000".to_string(),
            start_idx,
            end_idx: start_idx,
            capacity: 10,
            shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            shift_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }
    }

    fn stop(id: &str, location_idx: usize) -> VrpStop {
        VrpStop {
            id: id.to_string(),
            customer_id: Uuid::new_v4(),
            customer_name: id.to_string(),
            location_idx,
            service_duration_minutes: 30,
            time_window: None,
            priority: 1,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 26).unwrap()
    }

    #[test]
    fn empty_problem_returns_empty_solution() {
        let solver = VrpSolver::default();
        let problem = VrpProblem { vehicles: vec![], stops: vec![] };
        let matrices = mock_matrices(1);
        let solution = solver.solve(&problem, &matrices, day()).unwrap();
        assert!(solution.vehicle_routes.is_empty());
    }

    #[test]
    fn nearest_neighbor_fallback_assigns_all_stops_within_capacity() {
        let solver = VrpSolver::new(SolverConfig::instant());
        let problem = VrpProblem {
            vehicles: vec![vehicle("tech-a", 0)],
            stops: vec![stop("s1", 1), stop("s2", 2), stop("s3", 3)],
        };
        let matrices = mock_matrices(4);
        let solution = solver.nearest_neighbor_fallback(&problem, &matrices, day());
        assert_eq!(solution.total_stops(), 3);
        assert!(solution.unassigned.is_empty());
    }

    #[test]
    fn nearest_neighbor_fallback_respects_capacity_and_reports_unassigned() {
        let solver = VrpSolver::new(SolverConfig::instant());
        let mut v = vehicle("tech-a", 0);
        v.capacity = 1;
        let problem = VrpProblem { vehicles: vec![v], stops: vec![stop("s1", 1), stop("s2", 2)] };
        let matrices = mock_matrices(3);
        let solution = solver.nearest_neighbor_fallback(&problem, &matrices, day());
        assert_eq!(solution.total_stops(), 1);
        assert_eq!(solution.unassigned.len(), 1);
    }

    #[test]
    fn nearest_neighbor_fallback_splits_stops_across_two_vehicles() {
        let solver = VrpSolver::new(SolverConfig::instant());
        let problem = VrpProblem {
            vehicles: vec![vehicle("tech-a", 0), vehicle("tech-b", 1)],
            stops: vec![stop("s1", 2), stop("s2", 3)],
        };
        let matrices = mock_matrices(4);
        let solution = solver.nearest_neighbor_fallback(&problem, &matrices, day());
        assert_eq!(solution.total_stops(), 2);
        assert_eq!(solution.vehicle_routes.len(), 2);
    }

    #[test]
    fn single_customer_solve_has_zero_drive_distance_and_duration() {
        let solver = VrpSolver::new(SolverConfig::instant());
        let problem = VrpProblem { vehicles: vec![vehicle("tech-a", 0)], stops: vec![stop("s1", 1)] };
        // Nonzero distances/durations between every pair of distinct indices —
        // if the shortcut weren't taken this would show up in the result.
        let matrices = mock_matrices(2);
        let solution = solver.solve(&problem, &matrices, day()).unwrap();

        assert_eq!(solution.vehicle_routes.len(), 1);
        let route = &solution.vehicle_routes[0];
        assert_eq!(route.stops.len(), 1);
        assert_eq!(route.total_distance_meters, 0);
        assert_eq!(route.total_duration_seconds, 30 * 60);
    }

    #[test]
    fn single_customer_solve_leaves_other_vehicles_empty() {
        let solver = VrpSolver::new(SolverConfig::instant());
        let problem = VrpProblem {
            vehicles: vec![vehicle("tech-a", 0), vehicle("tech-b", 1)],
            stops: vec![stop("s1", 2)],
        };
        let matrices = mock_matrices(3);
        let solution = solver.solve(&problem, &matrices, day()).unwrap();

        assert_eq!(solution.vehicle_routes.len(), 2);
        assert_eq!(solution.vehicle_routes[0].stops.len(), 1);
        assert!(solution.vehicle_routes[1].stops.is_empty());
        assert_eq!(solution.vehicle_routes[1].total_distance_meters, 0);
    }

    #[test]
    fn add_seconds_to_time_wraps_at_midnight() {
        let time = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let result = add_seconds_to_time(time, 7200);
        assert_eq!(result.hour(), 1);
    }
}
