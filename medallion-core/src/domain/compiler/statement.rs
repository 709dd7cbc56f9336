// medallion-core/src/domain/compiler/statement.rs

use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;
use std::collections::BTreeSet;

use crate::domain::compiler::relations::{statement_relations, unqualified};
use crate::domain::error::DomainError;

/// A checked `CREATE OR REPLACE TABLE <target> AS <query>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceStatement {
    /// Unquoted, lowercased target table.
    pub target: String,
    /// Tables the query reads, CTEs excluded.
    pub reads: BTreeSet<String>,
}

impl ReplaceStatement {
    /// Checks that `sql` is exactly one `CREATE OR REPLACE TABLE <name> AS <query>`.
    pub fn parse(unit: &str, sql: &str) -> Result<Self, DomainError> {
        let contract_error = |reason: String| DomainError::TransformContract {
            unit: unit.to_string(),
            reason,
        };

        let statements = Parser::parse_sql(&DuckDbDialect {}, sql)
            .map_err(|e| contract_error(format!("unparseable SQL ({})", e)))?;

        let [statement] = statements.as_slice() else {
            return Err(contract_error(format!(
                "expected exactly one statement, found {}",
                statements.len()
            )));
        };

        match statement {
            Statement::CreateTable(create) if create.or_replace && create.query.is_some() => {
                let target = unqualified(&create.name);
                let reads = statement_relations(statement);
                tracing::debug!(unit, table = %target, ?reads, "Transform unit target resolved");
                Ok(Self { target, reads })
            }
            Statement::CreateTable(_) => Err(contract_error(
                "CREATE TABLE must use OR REPLACE and an AS SELECT body".into(),
            )),
            other => Err(contract_error(format!(
                "unsupported statement `{}`",
                first_words(&other.to_string())
            ))),
        }
    }
}

fn first_words(sql: &str) -> String {
    sql.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}
