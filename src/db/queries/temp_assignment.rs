//! `temp_assignments` queries.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::types::TempAssignment;

const TEMP_COLUMNS: &str = "id, tenant_id, customer_id, tech_id, service_day, assignment_date, created_at";

/// Delete every temp assignment whose `assignment_date` is older than the TTL window.
pub async fn purge_expired(tx: &mut Transaction<'_, Postgres>, tenant_id: Uuid, today: NaiveDate) -> Result<()> {
    let cutoff = today - chrono::Duration::days(crate::types::TEMP_ASSIGNMENT_TTL_DAYS);
    sqlx::query("DELETE FROM temp_assignments WHERE tenant_id = $1 AND assignment_date < $2")
        .bind(tenant_id)
        .bind(cutoff)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn get_current(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    customer_id: Uuid,
    service_day: &str,
    assignment_date: NaiveDate,
) -> Result<Option<TempAssignment>> {
    let sql = format!(
        "SELECT {TEMP_COLUMNS} FROM temp_assignments \
         WHERE tenant_id = $1 AND customer_id = $2 AND service_day = $3 AND assignment_date = $4"
    );
    let temp = sqlx::query_as::<_, TempAssignment>(&sql)
        .bind(tenant_id)
        .bind(customer_id)
        .bind(service_day)
        .bind(assignment_date)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(temp)
}

pub async fn delete_current(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    customer_id: Uuid,
    service_day: &str,
    assignment_date: NaiveDate,
) -> Result<()> {
    sqlx::query(
        "DELETE FROM temp_assignments \
         WHERE tenant_id = $1 AND customer_id = $2 AND service_day = $3 AND assignment_date = $4",
    )
    .bind(tenant_id)
    .bind(customer_id)
    .bind(service_day)
    .bind(assignment_date)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    customer_id: Uuid,
    tech_id: Uuid,
    service_day: &str,
    assignment_date: NaiveDate,
) -> Result<TempAssignment> {
    let sql = format!(
        r#"
        INSERT INTO temp_assignments (id, tenant_id, customer_id, tech_id, service_day, assignment_date, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        RETURNING {TEMP_COLUMNS}
        "#
    );
    let temp = sqlx::query_as::<_, TempAssignment>(&sql)
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(customer_id)
        .bind(tech_id)
        .bind(service_day)
        .bind(assignment_date)
        .fetch_one(&mut **tx)
        .await?;
    Ok(temp)
}

/// All non-expired temp assignments for a tenant/day/date, used to resolve
/// the effective assignment for every customer at once.
pub async fn list_active_for_day(
    pool: &PgPool,
    tenant_id: Uuid,
    service_day: &str,
    assignment_date: NaiveDate,
) -> Result<Vec<TempAssignment>> {
    let sql = format!(
        "SELECT {TEMP_COLUMNS} FROM temp_assignments \
         WHERE tenant_id = $1 AND service_day = $2 AND assignment_date = $3"
    );
    let temps = sqlx::query_as::<_, TempAssignment>(&sql)
        .bind(tenant_id)
        .bind(service_day)
        .bind(assignment_date)
        .fetch_all(pool)
        .await?;
    Ok(temps)
}
