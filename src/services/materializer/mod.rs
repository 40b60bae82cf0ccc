//! Lazily materializes per-tech per-day routes on read.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries::{customer as customer_queries, tech as tech_queries, temp_assignment as temp_queries};
use crate::services::optimization::OptimizationCoordinator;
use crate::services::persistence::RoutePersistence;
use crate::types::{CoreError, Customer, OptimizedRoute, ServiceDay, SpeedProfile};

/// Composes the effective assignment view (permanent + temp) into routes,
/// generating them once and persisting so later reads never re-solve.
pub struct DailyRouteMaterializer {
    pool: PgPool,
    optimization: Arc<OptimizationCoordinator>,
    persistence: Arc<RoutePersistence>,
}

impl DailyRouteMaterializer {
    pub fn new(pool: PgPool, optimization: Arc<OptimizationCoordinator>, persistence: Arc<RoutePersistence>) -> Self {
        Self { pool, optimization, persistence }
    }

    pub async fn get_day_routes(
        &self,
        tenant_id: Uuid,
        service_day: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<OptimizedRoute>, CoreError> {
        let existing = self.persistence.get_routes(tenant_id, service_day).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let day = ServiceDay::from_str_lower(service_day)
            .ok_or_else(|| CoreError::Validation(format!("unknown service_day: {service_day}")))?;

        let techs = tech_queries::list_active_techs(&self.pool, tenant_id).await?;
        if techs.is_empty() {
            return Ok(vec![]);
        }

        let all_customers = customer_queries::list_customers(&self.pool, tenant_id).await?;
        let temps = temp_queries::list_active_for_day(&self.pool, tenant_id, service_day, date).await?;
        let effective: HashMap<Uuid, Uuid> = temps.into_iter().map(|t| (t.customer_id, t.tech_id)).collect();

        for tech in &techs {
            let eligible: Vec<Customer> = all_customers
                .iter()
                .filter(|c| c.serves_on(day))
                .filter(|c| c.coordinates().is_some())
                .filter(|c| effective.get(&c.id).copied().or(c.assigned_tech_id) == Some(tech.id))
                .cloned()
                .collect();
            if eligible.is_empty() {
                continue;
            }

            let routes = self
                .optimization
                .solve_group(std::slice::from_ref(tech), &eligible, service_day, SpeedProfile::Quick)
                .await?;
            if let Some(route) = routes.into_iter().next() {
                self.persistence.save_route_for_tech(tenant_id, service_day, &route).await?;
            }
        }

        self.persistence.get_routes(tenant_id, service_day).await
    }
}
