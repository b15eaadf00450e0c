//! Database schema management for `chargepoint-etl`.
//!
//! Ensures the destination table exists before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the destination table if needed (idempotent).
///
/// The column set and order match `CleanRow`; every pipeline run replaces
/// the full contents of this table. Safe to call on every startup.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool, table: &str) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            charge_device_id       TEXT             NOT NULL,
            name                   TEXT             NOT NULL,
            latitude               DOUBLE PRECISION NOT NULL,
            longitude              DOUBLE PRECISION NOT NULL,
            postcode               TEXT             NOT NULL,
            town                   TEXT             NOT NULL,
            district               TEXT             NOT NULL,
            operator               TEXT             NOT NULL,
            usage_type             TEXT             NOT NULL,
            status                 TEXT             NOT NULL,
            pay_at_location        BOOLEAN          NOT NULL,
            is_membership_required BOOLEAN          NOT NULL,
            max_power_kw           DOUBLE PRECISION NOT NULL,
            connector_types        TEXT             NOT NULL,
            current_type           TEXT             NOT NULL,
            total_plugs            INTEGER          NOT NULL,
            operational_plugs      INTEGER          NOT NULL,
            date_created           TIMESTAMPTZ,
            data_quality_level     INTEGER          NOT NULL,
            last_verified          TIMESTAMPTZ,
            data_source            TEXT             NOT NULL,
            ingested_at            TIMESTAMPTZ      NOT NULL
        );
        "#
    ))
    .execute(&mut *tx)
    .await?;

    // Basic index for the common district roll-up query
    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{table}_district
            ON {table} (district);
        "#
    ))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
