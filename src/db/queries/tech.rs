//! Read-only queries against the externally-owned `techs` table.

use sqlx::PgPool;
use uuid::Uuid;
use anyhow::Result;

use crate::types::Tech;

const TECH_COLUMNS: &str = "id, tenant_id, name, color, \
    start_latitude, start_longitude, end_latitude, end_longitude, \
    working_hours_start, working_hours_end, \
    max_stops_per_day, efficiency_multiplier, is_active";

/// All active techs for a tenant.
pub async fn list_active_techs(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Tech>> {
    let sql = format!(
        "SELECT {TECH_COLUMNS} FROM techs WHERE tenant_id = $1 AND is_active = true ORDER BY name ASC"
    );
    let techs = sqlx::query_as::<_, Tech>(&sql).bind(tenant_id).fetch_all(pool).await?;
    Ok(techs)
}

/// A subset of techs by id, filtered to the given tenant.
pub async fn get_techs_by_ids(pool: &PgPool, tenant_id: Uuid, tech_ids: &[Uuid]) -> Result<Vec<Tech>> {
    let sql = format!(
        "SELECT {TECH_COLUMNS} FROM techs WHERE tenant_id = $1 AND id = ANY($2) AND is_active = true"
    );
    let techs = sqlx::query_as::<_, Tech>(&sql).bind(tenant_id).bind(tech_ids).fetch_all(pool).await?;
    Ok(techs)
}

/// A single tech, scoped to tenant.
pub async fn get_tech(pool: &PgPool, tenant_id: Uuid, tech_id: Uuid) -> Result<Option<Tech>> {
    let sql = format!("SELECT {TECH_COLUMNS} FROM techs WHERE tenant_id = $1 AND id = $2");
    let tech = sqlx::query_as::<_, Tech>(&sql).bind(tenant_id).bind(tech_id).fetch_optional(pool).await?;
    Ok(tech)
}
