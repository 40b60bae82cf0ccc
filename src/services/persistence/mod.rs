//! Route persistence: the transactional save/read/reorder/move surface
//! backing `tech_routes`.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries::{customer as customer_queries, route as route_queries, tech as tech_queries};
use crate::types::{CoreError, OptimizedRoute, RouteStopView, TechRoute};

/// Reads and writes `tech_routes`, joined against the externally-owned
/// `techs`/`customers` tables for display.
pub struct RoutePersistence {
    pool: PgPool,
}

impl RoutePersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verifies every `tech_id` in `routes` belongs to `tenant`, then
    /// replaces all `tech_routes` rows for `(tenant, service_day)` with the
    /// given set in a single transaction.
    pub async fn save_routes(
        &self,
        tenant_id: Uuid,
        service_day: &str,
        routes: &[OptimizedRoute],
    ) -> Result<Vec<Uuid>, CoreError> {
        if routes.is_empty() {
            let mut tx = self.pool.begin().await?;
            route_queries::delete_routes_for_day(&mut tx, tenant_id, service_day).await?;
            tx.commit().await?;
            return Ok(vec![]);
        }

        let tech_ids: Vec<Uuid> = routes.iter().map(|r| r.tech_id).collect();
        let known = tech_queries::get_techs_by_ids(&self.pool, tenant_id, &tech_ids).await?;
        let known_ids: HashSet<Uuid> = known.iter().map(|t| t.id).collect();
        if let Some(route) = routes.iter().find(|r| !known_ids.contains(&r.tech_id)) {
            return Err(CoreError::Validation(format!(
                "tech {} does not belong to tenant {tenant_id}",
                route.tech_id
            )));
        }

        let route_date = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;
        route_queries::delete_routes_for_day(&mut tx, tenant_id, service_day).await?;

        let mut saved_ids = Vec::with_capacity(routes.len());
        for route in routes {
            let stop_sequence: Vec<Uuid> = route.stops.iter().map(|s| s.customer_id).collect();
            let saved = route_queries::insert_route(
                &mut tx,
                tenant_id,
                route.tech_id,
                service_day,
                route_date,
                &stop_sequence,
                route.total_distance_miles,
                route.total_duration_minutes,
            )
            .await?;
            saved_ids.push(saved.id);
        }

        tx.commit().await?;
        Ok(saved_ids)
    }

    /// All routes for `(tenant, service_day)`, resolved to display records.
    pub async fn get_routes(&self, tenant_id: Uuid, service_day: &str) -> Result<Vec<OptimizedRoute>, CoreError> {
        let rows = route_queries::get_routes_for_day(&self.pool, tenant_id, service_day).await?;
        if rows.is_empty() {
            return Ok(vec![]);
        }
        self.resolve(tenant_id, &rows).await
    }

    /// Reorders the stops on one route. The caller's `(stop_id, new_sequence)`
    /// pairs are taken as a sort key over the route's existing stop set;
    /// anything not mentioned keeps its original relative order after the
    /// mentioned stops. The result is always renumbered to a dense `1..N`
    /// sequence, so an inconsistent or partial request cannot corrupt the
    /// stored order.
    pub async fn reorder_stops(
        &self,
        tenant_id: Uuid,
        route_id: Uuid,
        stops: &[(Uuid, u32)],
    ) -> Result<(), CoreError> {
        let route = route_queries::get_route_by_id(&self.pool, tenant_id, route_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("route {route_id}")))?;

        let requested: HashMap<Uuid, u32> = stops.iter().copied().collect();
        let mut ordered: Vec<(usize, Uuid)> = route.stop_sequence.0.iter().copied().enumerate().collect();
        ordered.sort_by_key(|(idx, id)| (requested.get(id).copied().unwrap_or(u32::MAX), *idx));
        let new_sequence: Vec<Uuid> = ordered.into_iter().map(|(_, id)| id).collect();

        let mut tx = self.pool.begin().await?;
        route_queries::update_stop_sequence(
            &mut tx,
            route_id,
            &new_sequence,
            route.total_distance_miles,
            route.total_duration_minutes,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Moves one stop from whichever route currently holds it into
    /// `target_route_id` at `insert_sequence` (clamped to `[1, len+1]`).
    /// Resequences both routes densely. Does not recompute distance/duration;
    /// those go stale until the next full solve.
    pub async fn move_stop(
        &self,
        tenant_id: Uuid,
        stop_id: Uuid,
        target_route_id: Uuid,
        insert_sequence: u32,
    ) -> Result<(), CoreError> {
        let target = route_queries::get_route_by_id(&self.pool, tenant_id, target_route_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("route {target_route_id}")))?;

        let day_routes = route_queries::get_routes_for_day(&self.pool, tenant_id, &target.service_day).await?;
        let source = day_routes
            .iter()
            .find(|r| r.stop_sequence.0.contains(&stop_id))
            .ok_or_else(|| CoreError::NotFound(format!("stop {stop_id} not found in any route for {}", target.service_day)))?
            .clone();

        if source.id == target.id {
            let mut seq: Vec<Uuid> = source.stop_sequence.0.iter().copied().filter(|id| *id != stop_id).collect();
            let pos = (insert_sequence as usize).saturating_sub(1).min(seq.len());
            seq.insert(pos, stop_id);

            let mut tx = self.pool.begin().await?;
            route_queries::update_stop_sequence(&mut tx, target.id, &seq, target.total_distance_miles, target.total_duration_minutes)
                .await?;
            tx.commit().await?;
            return Ok(());
        }

        let mut source_seq: Vec<Uuid> = source.stop_sequence.0.clone();
        source_seq.retain(|id| *id != stop_id);

        let mut target_seq: Vec<Uuid> = target.stop_sequence.0.clone();
        let pos = (insert_sequence as usize).saturating_sub(1).min(target_seq.len());
        target_seq.insert(pos, stop_id);

        let mut tx = self.pool.begin().await?;
        route_queries::update_stop_sequence(&mut tx, source.id, &source_seq, source.total_distance_miles, source.total_duration_minutes)
            .await?;
        route_queries::update_stop_sequence(&mut tx, target.id, &target_seq, target.total_distance_miles, target.total_duration_minutes)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replaces a single tech's route for `(tenant, service_day)`, leaving
    /// every other tech's route for that day untouched. Used by
    /// `TempAssignmentService` and `DailyRouteMaterializer`, which recompute
    /// one tech at a time and must not disturb the rest of the day.
    pub async fn save_route_for_tech(&self, tenant_id: Uuid, service_day: &str, route: &OptimizedRoute) -> Result<Uuid, CoreError> {
        let stop_sequence: Vec<Uuid> = route.stops.iter().map(|s| s.customer_id).collect();
        let route_date = Utc::now().date_naive();

        let mut tx = self.pool.begin().await?;
        route_queries::delete_route_for_tech_day(&mut tx, tenant_id, route.tech_id, service_day).await?;
        let saved = route_queries::insert_route(
            &mut tx,
            tenant_id,
            route.tech_id,
            service_day,
            route_date,
            &stop_sequence,
            route.total_distance_miles,
            route.total_duration_minutes,
        )
        .await?;
        tx.commit().await?;
        Ok(saved.id)
    }

    /// Deletes a single tech's route for `(tenant, service_day)`, if any —
    /// used when a recompute finds the tech has no eligible customers left.
    pub async fn delete_route_for_tech(&self, tenant_id: Uuid, tech_id: Uuid, service_day: &str) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await?;
        route_queries::delete_route_for_tech_day(&mut tx, tenant_id, tech_id, service_day).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Deletes every route for `(tenant, service_day)`.
    pub async fn delete_day(&self, tenant_id: Uuid, service_day: &str) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await?;
        route_queries::delete_routes_for_day(&mut tx, tenant_id, service_day).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Joins `tech_routes` rows with tech attributes and resolves each
    /// `stop_sequence` entry to a display record.
    async fn resolve(&self, tenant_id: Uuid, rows: &[TechRoute]) -> Result<Vec<OptimizedRoute>, CoreError> {
        let tech_ids: Vec<Uuid> = rows.iter().map(|r| r.tech_id).collect();
        let techs = tech_queries::get_techs_by_ids(&self.pool, tenant_id, &tech_ids).await?;
        let techs_by_id: HashMap<Uuid, _> = techs.into_iter().map(|t| (t.id, t)).collect();

        let customer_ids: Vec<Uuid> = rows.iter().flat_map(|r| r.stop_sequence.0.iter().copied()).collect();
        let customers = customer_queries::get_customers_by_ids(&self.pool, tenant_id, &customer_ids).await?;
        let customers_by_id: HashMap<Uuid, _> = customers.into_iter().map(|c| (c.id, c)).collect();

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(tech) = techs_by_id.get(&row.tech_id) else {
                continue;
            };
            let mut stops = Vec::with_capacity(row.stop_sequence.0.len());
            for (idx, customer_id) in row.stop_sequence.0.iter().enumerate() {
                let Some(customer) = customers_by_id.get(customer_id) else {
                    continue;
                };
                stops.push(RouteStopView {
                    customer_id: *customer_id,
                    name: customer.display_name.clone(),
                    address: customer.short_address(),
                    lat: customer.latitude.unwrap_or(0.0),
                    lng: customer.longitude.unwrap_or(0.0),
                    sequence: (idx + 1) as u32,
                    service_duration_min: customer.effective_service_min(),
                });
            }

            out.push(OptimizedRoute {
                tech_id: tech.id,
                tech_name: tech.name.clone(),
                tech_color: tech.color.clone(),
                service_day: row.service_day.clone(),
                start_location: tech.start(),
                end_location: tech.end(),
                total_customers: stops.len() as u32,
                stops,
                total_distance_miles: row.total_distance_miles,
                total_duration_minutes: row.total_duration_minutes,
                matrix_source: "persisted".to_string(),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorder_sort_key_places_requested_before_unmentioned() {
        let existing = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let requested: HashMap<Uuid, u32> = [(existing[2], 1), (existing[0], 2)].into_iter().collect();
        let mut ordered: Vec<(usize, Uuid)> = existing.iter().copied().enumerate().collect();
        ordered.sort_by_key(|(idx, id)| (requested.get(id).copied().unwrap_or(u32::MAX), *idx));
        let new_sequence: Vec<Uuid> = ordered.into_iter().map(|(_, id)| id).collect();
        assert_eq!(new_sequence, vec![existing[2], existing[0], existing[1]]);
    }

    #[test]
    fn move_stop_insert_clamps_to_bounds() {
        let seq = vec![Uuid::new_v4(), Uuid::new_v4()];
        let pos = (10_u32 as usize).saturating_sub(1).min(seq.len());
        assert_eq!(pos, seq.len());
        let pos = (0_u32 as usize).saturating_sub(1).min(seq.len());
        assert_eq!(pos, 0);
    }
}
