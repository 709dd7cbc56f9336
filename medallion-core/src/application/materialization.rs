// medallion-core/src/application/materialization.rs

use crate::application::transaction;
use crate::domain::project::manifest::{MaterializationType, NodeConfig};
use crate::error::MedallionError;
use crate::ports::connector::Connector;

pub struct Materializer;

impl Materializer {
    /// Rebuilds the model from scratch. The replace is a single statement, so a
    /// failing query leaves the previous version of the model in place.
    pub async fn materialize(
        connector: &dyn Connector,
        model_name: &str,
        executed_sql: &str,
        config: &NodeConfig,
    ) -> Result<String, MedallionError> {
        let strategy = config.materialized;

        let (ddl_query, conflicting) = match strategy {
            MaterializationType::Table => (
                format!("CREATE OR REPLACE TABLE \"{}\" AS {}", model_name, executed_sql),
                ("VIEW", "DROP VIEW"),
            ),
            MaterializationType::View => (
                format!("CREATE OR REPLACE VIEW \"{}\" AS {}", model_name, executed_sql),
                ("BASE TABLE", "DROP TABLE"),
            ),
        };

        // CREATE OR REPLACE cannot swap a view for a table (or back): drop the
        // other kind first, inside the same transaction as the rebuild.
        let (other_kind, drop_stmt) = conflicting;
        let needs_drop = connector
            .query_scalar(&format!(
                "SELECT count(*) FROM information_schema.tables \
                 WHERE table_name = '{}' AND table_type = '{}'",
                model_name.replace('\'', "''"),
                other_kind
            ))
            .await?
            > 0;

        let result = if needs_drop {
            transaction::begin(connector).await?;
            let rebuilt = async {
                connector
                    .execute(&format!("{} \"{}\"", drop_stmt, model_name))
                    .await?;
                connector.execute(&ddl_query).await
            }
            .await;
            transaction::finish(connector, rebuilt).await
        } else {
            connector.execute(&ddl_query).await
        };

        result.map_err(|e| {
            MedallionError::InternalError(format!(
                "Model '{}' failed.\n    🛑 DB Error: {}\n    📄 Query: {}",
                model_name, e, ddl_query
            ))
        })?;

        Ok(format!("{:?}", strategy).to_lowercase())
    }
}
