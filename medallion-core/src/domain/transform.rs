// medallion-core/src/domain/transform.rs

//! Transform units: self-contained queries that each rebuild one flattened table
//! from the contract table.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::domain::compiler::statement::ReplaceStatement;
use crate::domain::error::DomainError;

/// A unit as discovered on disk, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformUnit {
    pub name: String,
    pub path: PathBuf,
    pub raw_sql: String,
}

/// A rendered unit whose statement shape has been checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledUnit {
    pub name: String,
    pub target: String,
    /// Tables the unit reads. Only the contract table is allowed.
    pub reads: BTreeSet<String>,
    pub sql: String,
}

impl CompiledUnit {
    pub fn compile(name: &str, sql: String) -> Result<Self, DomainError> {
        let ReplaceStatement { target, reads } = ReplaceStatement::parse(name, &sql)?;
        Ok(Self {
            name: name.to_string(),
            target,
            reads,
            sql,
        })
    }
}

/// Units in apply order (lexical by unit name).
#[derive(Debug, Clone, Default)]
pub struct TransformPlan {
    units: Vec<CompiledUnit>,
}

impl TransformPlan {
    /// Orders the units and rejects plans where two units write the same table,
    /// a unit overwrites the contract table, or a unit reads anything but the
    /// contract table.
    pub fn new(mut units: Vec<CompiledUnit>, contract_table: &str) -> Result<Self, DomainError> {
        units.sort_by(|a, b| a.name.cmp(&b.name));

        let mut owners: HashMap<String, &str> = HashMap::new();
        for unit in &units {
            let target = unit.target.to_lowercase();
            if target == contract_table.to_lowercase() {
                return Err(DomainError::TransformContract {
                    unit: unit.name.clone(),
                    reason: format!("the contract table '{}' is not a valid target", target),
                });
            }
            if let Some(owner) = owners.insert(target.clone(), &unit.name) {
                return Err(DomainError::TransformContract {
                    unit: unit.name.clone(),
                    reason: format!("table '{}' is already produced by '{}'", target, owner),
                });
            }
        }

        let contract = contract_table.to_lowercase();
        for unit in &units {
            if let Some(upstream) = unit.reads.iter().find(|r| **r != contract) {
                return Err(DomainError::TransformDependency {
                    unit: unit.name.clone(),
                    upstream: upstream.clone(),
                });
            }
        }

        Ok(Self { units })
    }

    pub fn units(&self) -> &[CompiledUnit] {
        &self.units
    }

    pub fn targets(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.target.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
