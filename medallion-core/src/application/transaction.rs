// medallion-core/src/application/transaction.rs

use tracing::{debug, error};

use crate::error::MedallionError;
use crate::ports::connector::Connector;

pub async fn begin(connector: &dyn Connector) -> Result<(), MedallionError> {
    debug!("BEGIN TRANSACTION");
    connector.execute("BEGIN TRANSACTION").await
}

/// Commits on success, rolls back on failure. The stage's own error is what the
/// caller sees, even if the rollback fails too.
pub async fn finish<T>(
    connector: &dyn Connector,
    outcome: Result<T, MedallionError>,
) -> Result<T, MedallionError> {
    match outcome {
        Ok(value) => {
            connector.execute("COMMIT").await?;
            debug!("COMMIT");
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = connector.execute("ROLLBACK").await {
                error!("❌ Rollback failed: {}", rollback_err);
            } else {
                debug!("ROLLBACK");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::testing::MockConnector;

    #[tokio::test]
    async fn test_commit_on_success() {
        let connector = MockConnector::new();
        begin(&connector).await.unwrap();
        let value = finish(&connector, Ok(7)).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(connector.queries(), vec!["BEGIN TRANSACTION", "COMMIT"]);
    }

    #[tokio::test]
    async fn test_rollback_keeps_original_error() {
        let connector = MockConnector::new();
        begin(&connector).await.unwrap();
        let result: Result<(), _> =
            finish(&connector, Err(MedallionError::InternalError("boom".into()))).await;
        assert!(result.unwrap_err().to_string().contains("boom"));
        assert_eq!(connector.queries(), vec!["BEGIN TRANSACTION", "ROLLBACK"]);
    }
}
