// medallion-core/src/domain/gate.rs

//! Data-quality policy of the validation gate and the pure evaluation of a
//! contract-table profile against it.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::domain::contract::ContractTable;

pub const DEFAULT_NULL_RATE_THRESHOLD_PCT: f64 = 5.0;
pub const DEFAULT_CRITICAL_COLUMNS: [&str; 2] = ["resource_type", "resource_id"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GatePolicy {
    /// Highest accepted share of NULLs in a critical column, in percent.
    #[serde(default = "default_threshold")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub null_rate_threshold_pct: f64,

    #[serde(default = "default_critical_columns")]
    #[validate(length(min = 1))]
    pub critical_columns: Vec<String>,
}

fn default_threshold() -> f64 {
    DEFAULT_NULL_RATE_THRESHOLD_PCT
}

fn default_critical_columns() -> Vec<String> {
    DEFAULT_CRITICAL_COLUMNS.iter().map(|c| c.to_string()).collect()
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            null_rate_threshold_pct: default_threshold(),
            critical_columns: default_critical_columns(),
        }
    }
}

/// Facts about the contract table, gathered read-only from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractProfile {
    pub table: String,
    pub row_count: u64,
    /// Lowercased actual column names. Empty when the table does not exist.
    pub columns: Vec<String>,
    /// NULL counts of the critical columns that exist.
    pub null_counts: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    EmptyTable {
        table: String,
    },
    MissingColumns {
        columns: Vec<String>,
    },
    NullRateExceeded {
        column: String,
        null_count: u64,
        row_count: u64,
        rate_pct: f64,
        threshold_pct: f64,
    },
}

/// `nulls / rows` in tenths of a percent, rounded up: a rate above the threshold
/// never prints as the threshold itself.
fn rate_tenths_ceil(nulls: u64, rows: u64) -> u64 {
    if rows == 0 {
        return 0;
    }
    (nulls * 1000).div_ceil(rows)
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::EmptyTable { table } => {
                write!(f, "Contract table '{}' is empty (0 rows)", table)
            }
            Violation::MissingColumns { columns } => {
                write!(f, "Missing required columns: {}", columns.join(", "))
            }
            Violation::NullRateExceeded {
                column,
                null_count,
                row_count,
                threshold_pct,
                ..
            } => {
                let tenths = rate_tenths_ceil(*null_count, *row_count);
                write!(
                    f,
                    "{} null rate = {}.{}% (threshold: {}%)",
                    column,
                    tenths / 10,
                    tenths % 10,
                    threshold_pct
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub table: String,
    pub row_count: u64,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

impl GatePolicy {
    /// Runs every check; violations accumulate in check order.
    pub fn evaluate(&self, profile: &ContractProfile) -> ValidationReport {
        let mut violations = Vec::new();

        // 1. Row count
        if profile.row_count == 0 {
            violations.push(Violation::EmptyTable {
                table: profile.table.clone(),
            });
        }

        // 2. Required columns
        let missing: Vec<String> = ContractTable::required_columns()
            .filter(|required| !profile.columns.iter().any(|c| c == required))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            violations.push(Violation::MissingColumns { columns: missing });
        }

        // 3. Null rates (meaningless on an empty table)
        if profile.row_count > 0 {
            for column in &self.critical_columns {
                let Some((_, nulls)) = profile.null_counts.iter().find(|(c, _)| c == column)
                else {
                    continue;
                };
                let rate_pct = *nulls as f64 * 100.0 / profile.row_count as f64;
                if rate_pct > self.null_rate_threshold_pct {
                    violations.push(Violation::NullRateExceeded {
                        column: column.clone(),
                        null_count: *nulls,
                        row_count: profile.row_count,
                        rate_pct,
                        threshold_pct: self.null_rate_threshold_pct,
                    });
                }
            }
        }

        ValidationReport {
            table: profile.table.clone(),
            row_count: profile.row_count,
            violations,
        }
    }
}
