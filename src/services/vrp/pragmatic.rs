//! vrp-pragmatic solver integration — multi-vehicle.

use std::collections::HashMap;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};
use vrp_cli::extensions::solve::config::{Config, TerminationConfig, create_builder_from_config};
use vrp_core::solver::Solver;
use vrp_pragmatic::format::problem::{Matrix, PragmaticProblem, Problem};
use vrp_pragmatic::format::solution::{PragmaticOutputType, Solution as PragmaticSolution, write_pragmatic};

use crate::services::matrix::DistanceTimeMatrices;
use super::{
    build_pragmatic_matrix, build_pragmatic_problem, DEFAULT_PROFILE, PlannedStop, RouteSolution,
    RouteWarning, SolverConfig, VehicleRoute, VrpProblem,
};

pub fn solve_pragmatic(
    problem: &VrpProblem,
    matrices: &DistanceTimeMatrices,
    date: NaiveDate,
    config: &SolverConfig,
) -> Result<RouteSolution> {
    if problem.is_empty() {
        return Ok(RouteSolution::empty());
    }

    let problem_json = build_pragmatic_problem(problem, date, config);
    let problem_format: Problem =
        serde_json::from_value(problem_json).context("failed to deserialize pragmatic problem")?;

    let matrix: Matrix = build_pragmatic_matrix(matrices, DEFAULT_PROFILE);
    let core_problem = (problem_format, vec![matrix])
        .read_pragmatic()
        .context("failed to build core problem from pragmatic format")?;

    let core_problem = Arc::new(core_problem);
    let solver_config = build_solver_config(core_problem.clone(), config)?;

    let solution = Solver::new(core_problem.clone(), solver_config)
        .solve()
        .context("failed to solve VRP with vrp-pragmatic")?;

    let pragmatic = write_pragmatic_solution(core_problem.as_ref(), &solution)?;
    Ok(map_solution(problem, &pragmatic))
}

fn build_solver_config(
    problem: Arc<vrp_core::models::Problem>,
    config: &SolverConfig,
) -> Result<vrp_core::rosomaxa::evolution::EvolutionConfig<
    vrp_core::solver::RefinementContext,
    vrp_core::models::GoalContext,
    vrp_core::construction::heuristics::InsertionContext,
>> {
    let config = Config {
        termination: Some(TerminationConfig {
            max_time: Some(config.max_time_seconds as usize),
            max_generations: Some(config.max_generations),
            variation: None,
        }),
        evolution: None,
        hyper: None,
        environment: None,
        telemetry: None,
        output: None,
    };

    let builder = create_builder_from_config(problem, Vec::new(), &config)
        .context("failed to create solver builder")?;

    builder.build().context("failed to build solver configuration")
}

fn write_pragmatic_solution(
    problem: &vrp_core::models::Problem,
    solution: &vrp_core::models::Solution,
) -> Result<PragmaticSolution> {
    let mut writer = BufWriter::new(Vec::new());
    write_pragmatic(problem, solution, PragmaticOutputType::default(), &mut writer)
        .context("failed to serialize pragmatic solution")?;

    let bytes = writer.into_inner().context("failed to flush solution writer")?;
    let json = String::from_utf8(bytes).context("solution is not valid UTF-8")?;
    let parsed: PragmaticSolution =
        serde_json::from_str(&json).context("failed to parse pragmatic solution JSON")?;

    Ok(parsed)
}

fn map_solution(problem: &VrpProblem, solution: &PragmaticSolution) -> RouteSolution {
    let mut stop_by_id: HashMap<&str, &super::VrpStop> = HashMap::new();
    for stop in &problem.stops {
        stop_by_id.insert(stop.id.as_str(), stop);
    }

    let mut vehicle_routes = Vec::new();
    let mut warnings = Vec::new();

    for tour in &solution.tours {
        let mut planned_stops = Vec::new();

        for stop in &tour.stops {
            let schedule = stop.schedule();
            let arrival_time = parse_time(&schedule.arrival).unwrap_or(NaiveTime::MIN);
            let departure_time = parse_time(&schedule.departure).unwrap_or(NaiveTime::MIN);

            for activity in stop.activities() {
                if activity.activity_type == "departure" || activity.activity_type == "arrival" {
                    continue;
                }

                let stop_id = activity.job_id.as_str();
                if let Some(definition) = stop_by_id.get(stop_id) {
                    planned_stops.push(PlannedStop {
                        stop_id: definition.id.clone(),
                        customer_id: definition.customer_id,
                        customer_name: definition.customer_name.clone(),
                        order: (planned_stops.len() + 1) as u32,
                        arrival_time,
                        departure_time,
                    });
                } else {
                    warnings.push(RouteWarning {
                        stop_id: Some(activity.job_id.clone()),
                        warning_type: "UNKNOWN_JOB".to_string(),
                        message: "job in solution does not exist in input".to_string(),
                    });
                }
            }
        }

        vehicle_routes.push(VehicleRoute {
            vehicle_id: tour.vehicle_id.clone(),
            total_distance_meters: tour.statistic.distance.max(0) as u64,
            total_duration_seconds: tour.statistic.duration.max(0) as u64,
            stops: planned_stops,
        });
    }

    let unassigned = solution
        .unassigned
        .as_ref()
        .map(|items| items.iter().map(|job| job.job_id.clone()).collect())
        .unwrap_or_else(Vec::new);

    for job_id in &unassigned {
        warnings.push(RouteWarning {
            stop_id: Some(job_id.clone()),
            warning_type: "UNASSIGNED".to_string(),
            message: format!("stop '{}' could not be scheduled", job_id),
        });
    }

    RouteSolution {
        vehicle_routes,
        unassigned,
        warnings,
        algorithm: "vrp-pragmatic".to_string(),
        solve_time_ms: 0,
        solver_log: vec![],
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    DateTime::parse_from_rfc3339(value).ok().map(|parsed| parsed.time())
}
