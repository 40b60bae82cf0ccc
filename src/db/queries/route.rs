//! `tech_routes` queries.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::types::TechRoute;

const ROUTE_COLUMNS: &str = "id, tenant_id, tech_id, service_day, route_date, stop_sequence, \
    total_distance_miles, total_duration_minutes, created_at, updated_at";

/// Delete every `tech_routes` row for `(tenant, service_day)`, regardless of `route_date`.
pub async fn delete_routes_for_day(tx: &mut Transaction<'_, Postgres>, tenant_id: Uuid, service_day: &str) -> Result<()> {
    sqlx::query("DELETE FROM tech_routes WHERE tenant_id = $1 AND service_day = $2")
        .bind(tenant_id)
        .bind(service_day)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Delete the `tech_routes` row for one tech on one day, if any.
pub async fn delete_route_for_tech_day(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    tech_id: Uuid,
    service_day: &str,
) -> Result<()> {
    sqlx::query("DELETE FROM tech_routes WHERE tenant_id = $1 AND tech_id = $2 AND service_day = $3")
        .bind(tenant_id)
        .bind(tech_id)
        .bind(service_day)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_route(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    tech_id: Uuid,
    service_day: &str,
    route_date: NaiveDate,
    stop_sequence: &[Uuid],
    total_distance_miles: f64,
    total_duration_minutes: i32,
) -> Result<TechRoute> {
    let sql = format!(
        r#"
        INSERT INTO tech_routes (
            id, tenant_id, tech_id, service_day, route_date, stop_sequence,
            total_distance_miles, total_duration_minutes, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
        ON CONFLICT (tenant_id, tech_id, service_day, route_date)
        DO UPDATE SET
            stop_sequence = $6,
            total_distance_miles = $7,
            total_duration_minutes = $8,
            updated_at = NOW()
        RETURNING {ROUTE_COLUMNS}
        "#
    );

    let route = sqlx::query_as::<_, TechRoute>(&sql)
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(tech_id)
        .bind(service_day)
        .bind(route_date)
        .bind(sqlx::types::Json(stop_sequence.to_vec()))
        .bind(total_distance_miles)
        .bind(total_duration_minutes)
        .fetch_one(&mut **tx)
        .await?;

    Ok(route)
}

/// All routes for a tenant on a given day (any `route_date`).
pub async fn get_routes_for_day(pool: &PgPool, tenant_id: Uuid, service_day: &str) -> Result<Vec<TechRoute>> {
    let sql = format!("SELECT {ROUTE_COLUMNS} FROM tech_routes WHERE tenant_id = $1 AND service_day = $2");
    let routes = sqlx::query_as::<_, TechRoute>(&sql).bind(tenant_id).bind(service_day).fetch_all(pool).await?;
    Ok(routes)
}

pub async fn get_route_by_id(pool: &PgPool, tenant_id: Uuid, route_id: Uuid) -> Result<Option<TechRoute>> {
    let sql = format!("SELECT {ROUTE_COLUMNS} FROM tech_routes WHERE tenant_id = $1 AND id = $2");
    let route = sqlx::query_as::<_, TechRoute>(&sql).bind(tenant_id).bind(route_id).fetch_optional(pool).await?;
    Ok(route)
}

pub async fn update_stop_sequence(
    tx: &mut Transaction<'_, Postgres>,
    route_id: Uuid,
    stop_sequence: &[Uuid],
    total_distance_miles: f64,
    total_duration_minutes: i32,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE tech_routes
        SET stop_sequence = $2, total_distance_miles = $3, total_duration_minutes = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(route_id)
    .bind(sqlx::types::Json(stop_sequence.to_vec()))
    .bind(total_distance_miles)
    .bind(total_duration_minutes)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
