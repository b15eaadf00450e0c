//! Load stage: transactional full replace of the destination table.

use sqlx::PgPool;
use tracing::info;

use crate::pipeline::PipelineError;
use crate::CleanRow;

// ---

/// Replace the entire contents of `table` with `rows`.
///
/// Truncate and inserts run in one transaction, so readers observe either
/// the previous batch or the new one, never a partial state. Any failure
/// rolls the transaction back and surfaces as [`PipelineError::Load`].
pub async fn replace_all(pool: &PgPool, table: &str, rows: &[CleanRow]) -> Result<(), PipelineError> {
    // ---
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| PipelineError::Load(e.to_string()))?;

    sqlx::query(&format!("TRUNCATE TABLE {table}"))
        .execute(&mut *tx)
        .await
        .map_err(|e| PipelineError::Load(e.to_string()))?;

    let insert_sql = format!(
        r#"
        INSERT INTO {table} (
            charge_device_id, name, latitude, longitude, postcode, town,
            district, operator, usage_type, status, pay_at_location,
            is_membership_required, max_power_kw, connector_types,
            current_type, total_plugs, operational_plugs, date_created,
            data_quality_level, last_verified, data_source, ingested_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
            $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
        )
        "#
    );

    for row in rows {
        sqlx::query(&insert_sql)
            .bind(&row.charge_device_id)
            .bind(&row.name)
            .bind(row.latitude)
            .bind(row.longitude)
            .bind(&row.postcode)
            .bind(&row.town)
            .bind(&row.district)
            .bind(&row.operator)
            .bind(&row.usage_type)
            .bind(&row.status)
            .bind(row.pay_at_location)
            .bind(row.is_membership_required)
            .bind(row.max_power_kw)
            .bind(&row.connector_types)
            .bind(&row.current_type)
            .bind(row.total_plugs)
            .bind(row.operational_plugs)
            .bind(row.date_created)
            .bind(row.data_quality_level)
            .bind(row.last_verified)
            .bind(&row.data_source)
            .bind(row.ingested_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| PipelineError::Load(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| PipelineError::Load(e.to_string()))?;

    info!("Replaced {} with {} rows", table, rows.len());
    Ok(())
}
