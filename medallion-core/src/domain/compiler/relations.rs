// medallion-core/src/domain/compiler/relations.rs

use sqlparser::ast::{ObjectName, Query, Statement, TableFactor, Visit, Visitor};
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::{Parser, ParserError};
use std::collections::BTreeSet;
use std::ops::ControlFlow;

/// Collects the tables a statement reads. Table functions (`read_csv(...)`,
/// `range(3)`) are not tables; CTE names are dropped at the end.
#[derive(Default)]
struct RelationCollector {
    tables: BTreeSet<String>,
    ctes: BTreeSet<String>,
}

impl Visitor for RelationCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.ctes.insert(cte.alias.name.value.to_lowercase());
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        if let TableFactor::Table {
            name, args: None, ..
        } = table_factor
        {
            self.tables.insert(unqualified(name));
        }
        ControlFlow::Continue(())
    }
}

/// `main."stg_vitals"` -> `stg_vitals`, lowercased.
pub fn unqualified(name: &ObjectName) -> String {
    let qualified = name.to_string();
    qualified
        .rsplit('.')
        .next()
        .unwrap_or(qualified.as_str())
        .trim_matches('"')
        .to_lowercase()
}

/// Tables read by `statement`, lowercased, without CTEs.
pub fn statement_relations(statement: &Statement) -> BTreeSet<String> {
    let mut collector = RelationCollector::default();
    let _ = statement.visit(&mut collector);
    let RelationCollector { tables, ctes } = collector;
    tables.difference(&ctes).cloned().collect()
}

/// Tables read by every statement of `sql` (DuckDB dialect).
pub fn read_relations(sql: &str) -> Result<BTreeSet<String>, ParserError> {
    let statements = Parser::parse_sql(&DuckDbDialect {}, sql)?;
    Ok(statements.iter().flat_map(statement_relations).collect())
}
