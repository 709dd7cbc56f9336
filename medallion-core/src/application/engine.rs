// medallion-core/src/application/engine.rs

use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::error::MedallionError;
use crate::ports::connector::{ColumnSchema, Connector, QueryResult};

/// Runs an ad-hoc query with timing instrumentation.
#[instrument(skip(connector), fields(query.len = query.len()))]
pub async fn execute_query(
    connector: &dyn Connector,
    query: &str,
) -> Result<QueryResult, MedallionError> {
    let start = Instant::now();
    debug!("⚡ Executing Query: {}", query);

    let result = connector.fetch_rows(query).await;
    let duration = start.elapsed();

    match result {
        Ok(rows) => {
            debug!(rows = rows.rows.len(), "✅ Query finished in {:.2?}", duration);
            Ok(rows)
        }
        Err(e) => {
            error!("❌ Query failed after {:.2?}: {}", duration, e);
            Err(e)
        }
    }
}

/// Schema plus the first `limit` rows of `table`.
#[instrument(skip(connector))]
pub async fn inspect_table(
    connector: &dyn Connector,
    table: &str,
    limit: usize,
) -> Result<(Vec<ColumnSchema>, QueryResult), MedallionError> {
    let columns = connector.fetch_columns(table).await?;
    if columns.is_empty() {
        return Err(MedallionError::InternalError(format!(
            "Table '{}' does not exist",
            table
        )));
    }
    let sample = execute_query(
        connector,
        &format!("SELECT * FROM \"{}\" LIMIT {}", table.replace('"', "\"\""), limit),
    )
    .await?;
    Ok((columns, sample))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::testing::MockConnector;

    #[tokio::test]
    async fn test_inspect_unknown_table_fails() {
        let connector = MockConnector::new();
        assert!(inspect_table(&connector, "nope", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_inspect_known_table() {
        let connector = MockConnector::new().with_table("vitals_wide", &[("encounter_id", "VARCHAR")]);
        let (columns, _) = inspect_table(&connector, "vitals_wide", 5).await.unwrap();
        assert_eq!(columns[0].name, "encounter_id");
    }
}
