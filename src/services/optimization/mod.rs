//! Decides which customers and techs enter a solve, how many solves to run,
//! and aggregates the result. The three modes (`refine`, `full_per_day`,
//! `cross_day`) share one underlying fleet solve; they differ only in how
//! the customer/tech groups going into that solve are built.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use itertools::Itertools;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::db::queries::{customer as customer_queries, tech as tech_queries, temp_assignment as temp_queries};
use crate::services::matrix::MatrixProvider;
use crate::services::vrp::{build_fleet_problem, SolverConfig, VrpSolver};
use crate::types::{
    CoreError, Customer, OptimizeMode, OptimizeRequest, OptimizeResult, OptimizeSummary, OptimizedRoute,
    RouteStopView, ServiceDay, SpeedProfile, Tech,
};

pub struct OptimizationCoordinator {
    pool: PgPool,
    matrix_provider: Arc<dyn MatrixProvider>,
}

impl OptimizationCoordinator {
    pub fn new(pool: PgPool, matrix_provider: Arc<dyn MatrixProvider>) -> Self {
        Self { pool, matrix_provider }
    }

    pub async fn optimize(&self, tenant_id: Uuid, request: &OptimizeRequest) -> Result<OptimizeResult, CoreError> {
        match request.mode {
            OptimizeMode::Refine => self.optimize_refine(tenant_id, request).await,
            OptimizeMode::FullPerDay => self.optimize_full_per_day(tenant_id, request).await,
            OptimizeMode::CrossDay => self.optimize_cross_day(tenant_id, request).await,
        }
    }

    /// Keep each tech's assigned customers; only reorder within each tech.
    /// Never moves a customer between techs, except that `include_unassigned`
    /// round-robins customers with no effective tech across the selected
    /// techs rather than dropping them.
    async fn optimize_refine(&self, tenant_id: Uuid, request: &OptimizeRequest) -> Result<OptimizeResult, CoreError> {
        let day = self.require_day(request)?;
        let today = Utc::now().date_naive();
        let speed = request.speed.unwrap_or(SpeedProfile::Quick);

        let techs = self.load_techs(tenant_id, &request.selected_tech_ids).await?;
        if techs.is_empty() {
            return Ok(OptimizeResult::empty("no techs available"));
        }

        let all_customers = customer_queries::list_customers(&self.pool, tenant_id).await?;
        let effective = self.effective_assignments(tenant_id, day.as_str(), today).await?;

        let mut groups: HashMap<Uuid, Vec<Customer>> = techs.iter().map(|t| (t.id, Vec::new())).collect();
        let mut unassigned_pool: Vec<Customer> = Vec::new();
        let mut skipped = Vec::new();

        for customer in all_customers {
            if !customer.eligible(request.include_pending) {
                continue;
            }
            if !customer.serves_on(day) {
                continue;
            }
            if customer.coordinates().is_none() {
                skipped.push(customer.id);
                continue;
            }
            let effective_tech = effective.get(&customer.id).copied().or(customer.assigned_tech_id);
            match effective_tech {
                Some(tech_id) if groups.contains_key(&tech_id) => {
                    groups.get_mut(&tech_id).unwrap().push(customer);
                }
                None if request.include_unassigned => unassigned_pool.push(customer),
                _ => {}
            }
        }

        if request.include_unassigned {
            for (i, customer) in unassigned_pool.into_iter().enumerate() {
                let tech_id = techs[i % techs.len()].id;
                groups.get_mut(&tech_id).unwrap().push(customer);
            }
        }

        let mut routes = Vec::new();
        let mut total_customers = 0u32;
        for tech in &techs {
            let group = &groups[&tech.id];
            if group.is_empty() {
                continue;
            }
            let tech_routes =
                self.solve_group(std::slice::from_ref(tech), group, day.as_str(), speed).await?;
            total_customers += tech_routes.iter().map(|r| r.total_customers).sum::<u32>();
            routes.extend(tech_routes);
        }

        Ok(OptimizeResult {
            routes,
            summary: OptimizeSummary { total_routes: routes.len() as u32, total_customers, skipped, failed_days: vec![] },
            message: None,
        })
    }

    /// Reassigns all eligible customers among the selected (or all active)
    /// techs for one day.
    async fn optimize_full_per_day(&self, tenant_id: Uuid, request: &OptimizeRequest) -> Result<OptimizeResult, CoreError> {
        let day = self.require_day(request)?;
        let speed = request.speed.unwrap_or(SpeedProfile::Quick);

        let techs = self.load_techs(tenant_id, &request.selected_tech_ids).await?;
        let all_customers = customer_queries::list_customers(&self.pool, tenant_id).await?;

        let (eligible, skipped) = self.filter_eligible(all_customers, request, day);
        let routes = self.solve_group(&techs, &eligible, day.as_str(), speed).await?;
        let total_customers = routes.iter().map(|r| r.total_customers).sum();
        let total_routes = routes.len() as u32;

        Ok(OptimizeResult {
            routes,
            summary: OptimizeSummary { total_routes, total_customers, skipped, failed_days: vec![] },
            message: None,
        })
    }

    /// Lets `unlocked_customer_ids` change day to balance weekly workload,
    /// then optimizes each active day separately. A failure on one day is
    /// logged and recorded in `failed_days`; it does not abort the rest.
    async fn optimize_cross_day(&self, tenant_id: Uuid, request: &OptimizeRequest) -> Result<OptimizeResult, CoreError> {
        let days = ServiceDay::default_set(request.include_saturday, request.include_sunday);
        let speed = request.speed.unwrap_or(SpeedProfile::Quick);

        let customers = customer_queries::list_customers(&self.pool, tenant_id).await?;
        let techs = self.load_techs(tenant_id, &request.selected_tech_ids).await?;
        let unlocked: std::collections::HashSet<Uuid> = request.unlocked_customer_ids.iter().copied().collect();

        let mut day_assignment: HashMap<Uuid, Vec<ServiceDay>> = HashMap::new();
        for customer in &customers {
            day_assignment.insert(customer.id, initial_days(customer));
        }

        let mut counts: HashMap<ServiceDay, u32> = days.iter().map(|d| (*d, 0)).collect();
        for assigned in day_assignment.values() {
            for d in assigned {
                if let Some(c) = counts.get_mut(d) {
                    *c += 1;
                }
            }
        }

        for customer in &customers {
            if customer.locked || !unlocked.contains(&customer.id) {
                continue;
            }
            let current = day_assignment.get(&customer.id).cloned().unwrap_or_default();
            if current.is_empty() {
                continue;
            }

            if customer.days_per_week <= 1 {
                let cur_day = current[0];
                if let Some(min_day) = days.iter().copied().min_by_key(|d| counts[d]) {
                    if counts[&min_day] < counts[&cur_day] {
                        *counts.get_mut(&cur_day).unwrap() -= 1;
                        *counts.get_mut(&min_day).unwrap() += 1;
                        day_assignment.insert(customer.id, vec![min_day]);
                    }
                }
                continue;
            }

            let k = customer.days_per_week as usize;
            if k == 0 || days.len() < k {
                continue;
            }
            let baseline = workload_variance(&counts, &days);
            let mut best_combo = current.clone();
            let mut best_variance = baseline;
            for combo in days.iter().copied().combinations(k) {
                if combo == current {
                    continue;
                }
                let mut trial = counts.clone();
                for d in &current {
                    if let Some(c) = trial.get_mut(d) {
                        *c = c.saturating_sub(1);
                    }
                }
                for d in &combo {
                    *trial.get_mut(d).unwrap() += 1;
                }
                let variance = workload_variance(&trial, &days);
                if variance < best_variance {
                    best_variance = variance;
                    best_combo = combo;
                }
            }
            if best_combo != current {
                for d in &current {
                    if let Some(c) = counts.get_mut(d) {
                        *c = c.saturating_sub(1);
                    }
                }
                for d in &best_combo {
                    *counts.get_mut(d).unwrap() += 1;
                }
                day_assignment.insert(customer.id, best_combo);
            }
        }

        let mut routes = Vec::new();
        let mut failed_days = Vec::new();
        let mut skipped = Vec::new();
        let mut total_customers = 0u32;

        for day in &days {
            let day_customers: Vec<Customer> = customers
                .iter()
                .filter(|c| c.eligible(request.include_pending))
                .filter(|c| day_assignment.get(&c.id).map(|ds| ds.contains(day)).unwrap_or(false))
                .cloned()
                .collect();

            let mut eligible = Vec::with_capacity(day_customers.len());
            for customer in day_customers {
                if customer.coordinates().is_none() {
                    skipped.push(customer.id);
                    continue;
                }
                eligible.push(customer);
            }
            if eligible.is_empty() {
                continue;
            }

            match self.solve_group(&techs, &eligible, day.as_str(), speed).await {
                Ok(day_routes) => {
                    total_customers += day_routes.iter().map(|r| r.total_customers).sum::<u32>();
                    routes.extend(day_routes);
                }
                Err(err) => {
                    warn!("cross_day optimize failed for {}: {}", day, err);
                    failed_days.push(day.as_str().to_string());
                }
            }
        }

        Ok(OptimizeResult {
            routes,
            summary: OptimizeSummary { total_routes: routes.len() as u32, total_customers, skipped, failed_days },
            message: None,
        })
    }

    fn require_day(&self, request: &OptimizeRequest) -> Result<ServiceDay, CoreError> {
        let raw = request.service_day.as_deref().ok_or_else(|| CoreError::Validation("service_day is required".to_string()))?;
        ServiceDay::from_str_lower(raw).ok_or_else(|| CoreError::Validation(format!("unknown service_day: {raw}")))
    }

    fn filter_eligible(&self, customers: Vec<Customer>, request: &OptimizeRequest, day: ServiceDay) -> (Vec<Customer>, Vec<Uuid>) {
        let mut eligible = Vec::with_capacity(customers.len());
        let mut skipped = Vec::new();
        for customer in customers {
            if !customer.eligible(request.include_pending) {
                continue;
            }
            if !customer.serves_on(day) {
                continue;
            }
            if customer.coordinates().is_none() {
                skipped.push(customer.id);
                continue;
            }
            eligible.push(customer);
        }
        (eligible, skipped)
    }

    async fn load_techs(&self, tenant_id: Uuid, selected: &[Uuid]) -> Result<Vec<Tech>, CoreError> {
        if selected.is_empty() {
            Ok(tech_queries::list_active_techs(&self.pool, tenant_id).await?)
        } else {
            Ok(tech_queries::get_techs_by_ids(&self.pool, tenant_id, selected).await?)
        }
    }

    async fn effective_assignments(&self, tenant_id: Uuid, service_day: &str, date: NaiveDate) -> Result<HashMap<Uuid, Uuid>, CoreError> {
        let temps = temp_queries::list_active_for_day(&self.pool, tenant_id, service_day, date).await?;
        Ok(temps.into_iter().map(|t| (t.customer_id, t.tech_id)).collect())
    }

    /// Runs one fleet solve (possibly a single-vehicle one) off the async
    /// scheduler and maps the result back to display records.
    pub(crate) async fn solve_group(
        &self,
        techs: &[Tech],
        customers: &[Customer],
        service_day: &str,
        speed: SpeedProfile,
    ) -> Result<Vec<OptimizedRoute>, CoreError> {
        if techs.is_empty() || customers.is_empty() {
            return Ok(vec![]);
        }

        let (problem, points) = build_fleet_problem(techs, customers);
        let matrices = self.matrix_provider.get_matrix(&points).await;
        let config = SolverConfig::from_profile(speed);
        let date = Utc::now().date_naive();

        let solution = tokio::task::spawn_blocking(move || {
            let solver = VrpSolver::new(config);
            solver.solve(&problem, &matrices, date)
        })
        .await
        .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))??;

        Ok(map_solution(techs, customers, service_day, solution))
    }
}

fn initial_days(customer: &Customer) -> Vec<ServiceDay> {
    if customer.days_per_week <= 1 {
        return ServiceDay::from_str_lower(&customer.primary_day).map(|d| vec![d]).unwrap_or_default();
    }
    match &customer.schedule_pattern {
        Some(pattern) => crate::types::parse_schedule_pattern(pattern),
        None => ServiceDay::from_str_lower(&customer.primary_day).map(|d| vec![d]).unwrap_or_default(),
    }
}

fn workload_variance(counts: &HashMap<ServiceDay, u32>, days: &[ServiceDay]) -> f64 {
    let values: Vec<f64> = days.iter().map(|d| counts[d] as f64).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn map_solution(techs: &[Tech], customers: &[Customer], service_day: &str, solution: crate::services::vrp::RouteSolution) -> Vec<OptimizedRoute> {
    let techs_by_id: HashMap<Uuid, &Tech> = techs.iter().map(|t| (t.id, t)).collect();
    let customers_by_id: HashMap<Uuid, &Customer> = customers.iter().map(|c| (c.id, c)).collect();

    solution
        .vehicle_routes
        .into_iter()
        .filter_map(|vehicle_route| {
            let tech_id: Uuid = vehicle_route.vehicle_id.parse().ok()?;
            let tech = *techs_by_id.get(&tech_id)?;

            let stops: Vec<RouteStopView> = vehicle_route
                .stops
                .iter()
                .filter_map(|planned| {
                    let customer = *customers_by_id.get(&planned.customer_id)?;
                    Some(RouteStopView {
                        customer_id: planned.customer_id,
                        name: planned.customer_name.clone(),
                        address: customer.short_address(),
                        lat: customer.latitude.unwrap_or(0.0),
                        lng: customer.longitude.unwrap_or(0.0),
                        sequence: planned.order,
                        service_duration_min: customer.effective_service_min(),
                    })
                })
                .collect();

            if stops.is_empty() {
                return None;
            }

            Some(OptimizedRoute {
                tech_id: tech.id,
                tech_name: tech.name.clone(),
                tech_color: tech.color.clone(),
                service_day: service_day.to_string(),
                start_location: tech.start(),
                end_location: tech.end(),
                total_customers: stops.len() as u32,
                stops,
                total_distance_miles: vehicle_route.total_distance_meters as f64 * 0.000_621_371,
                total_duration_minutes: (vehicle_route.total_duration_seconds / 60) as i32,
                matrix_source: "solved".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> Vec<ServiceDay> {
        ServiceDay::default_set(false, false)
    }

    #[test]
    fn workload_variance_is_zero_for_even_counts() {
        let days = day();
        let counts: HashMap<ServiceDay, u32> = days.iter().map(|d| (*d, 3)).collect();
        assert_eq!(workload_variance(&counts, &days), 0.0);
    }

    #[test]
    fn workload_variance_is_positive_for_uneven_counts() {
        let days = day();
        let mut counts: HashMap<ServiceDay, u32> = days.iter().map(|d| (*d, 3)).collect();
        *counts.get_mut(&ServiceDay::Monday).unwrap() = 10;
        assert!(workload_variance(&counts, &days) > 0.0);
    }

    #[test]
    fn initial_days_falls_back_to_primary_day_without_pattern() {
        let customer = Customer {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            display_name: "Jane".to_string(),
            address: "1 Main St".to_string(),
            latitude: None,
            longitude: None,
            service_type: crate::types::ServiceType::Residential,
            visit_duration_min: 20,
            difficulty: 1,
            primary_day: "tuesday".to_string(),
            days_per_week: 2,
            schedule_pattern: None,
            locked: false,
            time_window_start: None,
            time_window_end: None,
            assigned_tech_id: None,
            is_active: true,
            status: crate::types::CustomerStatus::Active,
        };
        assert_eq!(initial_days(&customer), vec![ServiceDay::Tuesday]);
    }
}
