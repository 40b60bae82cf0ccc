//! Read-only queries against the externally-owned `customers` table.

use sqlx::PgPool;
use uuid::Uuid;
use anyhow::Result;

use crate::types::Customer;

const CUSTOMER_COLUMNS: &str = "id, tenant_id, display_name, address, latitude, longitude, \
    service_type, visit_duration_min, difficulty, primary_day, days_per_week, schedule_pattern, \
    locked, time_window_start, time_window_end, assigned_tech_id, is_active, status";

/// All customers for a tenant, regardless of status — callers apply
/// `Customer::eligible`/`serves_on` themselves so the filtering logic stays
/// in one place (the domain type), not duplicated in SQL.
pub async fn list_customers(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1");
    let customers = sqlx::query_as::<_, Customer>(&sql).bind(tenant_id).fetch_all(pool).await?;
    Ok(customers)
}

/// A subset of customers by id, used to resolve a persisted `stop_sequence`
/// back into display records.
pub async fn get_customers_by_ids(pool: &PgPool, tenant_id: Uuid, customer_ids: &[Uuid]) -> Result<Vec<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND id = ANY($2)");
    let customers =
        sqlx::query_as::<_, Customer>(&sql).bind(tenant_id).bind(customer_ids).fetch_all(pool).await?;
    Ok(customers)
}

/// A single customer, scoped to tenant.
pub async fn get_customer(pool: &PgPool, tenant_id: Uuid, customer_id: Uuid) -> Result<Option<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND id = $2");
    let customer =
        sqlx::query_as::<_, Customer>(&sql).bind(tenant_id).bind(customer_id).fetch_optional(pool).await?;
    Ok(customer)
}
