// medallion-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::types::{TimeUnit, Value};
use duckdb::{Config, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::MedallionError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{ColumnSchema, Connector, QueryResult};

/// The single connection of a run. Stages take turns on it; nothing executes
/// concurrently against the store.
pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// The store of a project: `:memory:`, or a file path relative to the project
    /// directory whose parent is created on demand.
    pub fn open(project_dir: &Path, database_path: &str) -> Result<Self, InfrastructureError> {
        if database_path == ":memory:" {
            return Self::new(database_path);
        }
        let path = project_dir.join(database_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::new(&path.to_string_lossy())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, MedallionError> {
        self.conn
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned).into())
    }
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn execute(&self, query: &str) -> Result<(), MedallionError> {
        let conn = self.lock()?;
        conn.execute_batch(query)?;
        Ok(())
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, MedallionError> {
        let conn = self.lock()?;

        // PRAGMA table_info raises on unknown tables: ask the catalog first.
        let exists: i64 = conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            [table_name],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(&format!(
            "PRAGMA table_info('{}')",
            table_name.replace('\'', "''")
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(ColumnSchema {
                name: row.get("name")?,
                data_type: row.get("type")?,
                is_nullable: !row.get::<_, bool>("notnull")?,
            })
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }

        Ok(columns)
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool, MedallionError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            [table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, MedallionError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;

        let row = rows
            .next()?
            .ok_or_else(|| MedallionError::InternalError("No scalar value returned".into()))?;

        let value: i64 = row.get(0)?;
        u64::try_from(value).map_err(|_| {
            MedallionError::InternalError(format!("Negative scalar value returned: {}", value))
        })
    }

    async fn fetch_rows(&self, query: &str) -> Result<QueryResult, MedallionError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;

        // Column metadata is only available once the statement has run.
        let columns = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut result = QueryResult {
            columns,
            rows: Vec::new(),
        };
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(result.columns.len());
            for i in 0..result.columns.len() {
                values.push(render_value(row.get::<_, Value>(i)?));
            }
            result.rows.push(values);
        }

        Ok(result)
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

fn render_value(value: Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::TinyInt(i) => i.to_string(),
        Value::SmallInt(i) => i.to_string(),
        Value::Int(i) => i.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::HugeInt(i) => i.to_string(),
        Value::UTinyInt(i) => i.to_string(),
        Value::USmallInt(i) => i.to_string(),
        Value::UInt(i) => i.to_string(),
        Value::UBigInt(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros)
                .map(|dt| dt.naive_utc().to_string())
                .unwrap_or_else(|| raw.to_string())
        }
        other => format!("{:?}", other),
    }
}
