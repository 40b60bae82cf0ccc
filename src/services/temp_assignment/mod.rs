//! Day-scoped customer→tech reassignment with a TTL, plus the partial
//! re-optimization it triggers on the affected techs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex as SyncMutex;
use sqlx::PgPool;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::db::queries::{customer as customer_queries, tech as tech_queries, temp_assignment as temp_queries};
use crate::services::optimization::OptimizationCoordinator;
use crate::services::persistence::RoutePersistence;
use crate::types::{CoreError, Customer, OptimizedRoute, ServiceDay, SpeedProfile};

type LockKey = (Uuid, String, NaiveDate);

/// Serializes `set_temp_assignment` per `(tenant, service_day, date)` so two
/// concurrent reassignments on the same day can't leave `TechRoute`s
/// inconsistent with temps. In-process only — a multi-process deployment
/// would need an advisory DB lock instead, which this does not take.
pub struct TempAssignmentService {
    pool: PgPool,
    optimization: Arc<OptimizationCoordinator>,
    persistence: Arc<RoutePersistence>,
    locks: SyncMutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl TempAssignmentService {
    pub fn new(pool: PgPool, optimization: Arc<OptimizationCoordinator>, persistence: Arc<RoutePersistence>) -> Self {
        Self { pool, optimization, persistence, locks: SyncMutex::new(HashMap::new()) }
    }

    pub async fn set_temp_assignment(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        new_tech_id: Uuid,
        service_day: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<OptimizedRoute>, CoreError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let _guard = self.lock_for(tenant_id, service_day, date).await;

        let customer = customer_queries::get_customer(&self.pool, tenant_id, customer_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("customer {customer_id}")))?;

        let mut tx = self.pool.begin().await?;
        temp_queries::purge_expired(&mut tx, tenant_id, date).await?;
        let prev_temp = temp_queries::get_current(&mut tx, tenant_id, customer_id, service_day, date).await?;
        let prev_tech = prev_temp.map(|t| t.tech_id).or(customer.assigned_tech_id);
        temp_queries::delete_current(&mut tx, tenant_id, customer_id, service_day, date).await?;
        if Some(new_tech_id) != customer.assigned_tech_id {
            temp_queries::insert(&mut tx, tenant_id, customer_id, new_tech_id, service_day, date).await?;
        }
        tx.commit().await?;

        let mut affected = vec![new_tech_id];
        if let Some(prev) = prev_tech {
            if prev != new_tech_id {
                affected.push(prev);
            }
        }

        let mut regenerated = Vec::with_capacity(affected.len());
        for tech_id in affected {
            if let Some(route) = self.regenerate_tech_route(tenant_id, tech_id, service_day, date).await? {
                regenerated.push(route);
            }
        }
        Ok(regenerated)
    }

    async fn regenerate_tech_route(
        &self,
        tenant_id: Uuid,
        tech_id: Uuid,
        service_day: &str,
        date: NaiveDate,
    ) -> Result<Option<OptimizedRoute>, CoreError> {
        let tech = tech_queries::get_tech(&self.pool, tenant_id, tech_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("tech {tech_id}")))?;
        let day = ServiceDay::from_str_lower(service_day)
            .ok_or_else(|| CoreError::Validation(format!("unknown service_day: {service_day}")))?;

        let all_customers = customer_queries::list_customers(&self.pool, tenant_id).await?;
        let temps = temp_queries::list_active_for_day(&self.pool, tenant_id, service_day, date).await?;
        let effective: HashMap<Uuid, Uuid> = temps.into_iter().map(|t| (t.customer_id, t.tech_id)).collect();

        let eligible: Vec<Customer> = all_customers
            .into_iter()
            .filter(|c| c.serves_on(day))
            .filter(|c| c.coordinates().is_some())
            .filter(|c| effective.get(&c.id).copied().or(c.assigned_tech_id) == Some(tech_id))
            .collect();

        if eligible.is_empty() {
            self.persistence.delete_route_for_tech(tenant_id, tech_id, service_day).await?;
            return Ok(None);
        }

        let routes = self
            .optimization
            .solve_group(std::slice::from_ref(&tech), &eligible, service_day, SpeedProfile::Quick)
            .await?;

        match routes.into_iter().next() {
            Some(route) => {
                self.persistence.save_route_for_tech(tenant_id, service_day, &route).await?;
                Ok(Some(route))
            }
            None => {
                self.persistence.delete_route_for_tech(tenant_id, tech_id, service_day).await?;
                Ok(None)
            }
        }
    }

    async fn lock_for(&self, tenant_id: Uuid, service_day: &str, date: NaiveDate) -> OwnedMutexGuard<()> {
        let key = (tenant_id, service_day.to_string(), date);
        let entry = {
            let mut locks = self.locks.lock();
            locks.entry(key).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}
