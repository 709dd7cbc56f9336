// medallion-core/src/domain/project/configuration.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

use crate::domain::contract::DEFAULT_CONTRACT_TABLE;
use crate::domain::gate::GatePolicy;

/// LOINC vital-sign codes tracked by the flattening and pivot SQL, `(code, column)`.
pub const DEFAULT_TRACKED_CODES: [(&str, &str); 6] = [
    ("8867-4", "heart_rate"),
    ("9279-1", "respiratory_rate"),
    ("2708-6", "oxygen_saturation"),
    ("8310-5", "body_temperature"),
    ("8480-6", "systolic_bp"),
    ("8462-4", "diastolic_bp"),
];

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct TrackedCode {
    /// Terminology code (LOINC, SNOMED...), compared as a SQL string literal.
    #[validate(custom(function = "validate_code"))]
    pub code: String,
    /// Column name used for this code in the wide tables.
    #[validate(custom(function = "validate_identifier"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1))]
    pub name: String,
    pub version: String,

    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    #[serde(rename = "data-path", default = "default_data_path")]
    pub data_path: String,

    #[serde(rename = "transform-path", default = "default_transform_path")]
    pub transform_path: String,

    #[serde(rename = "model-paths", default = "default_model_paths")]
    pub model_paths: Vec<String>,

    #[serde(rename = "config-paths", default = "default_config_paths")]
    pub config_paths: Vec<String>,

    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,

    #[serde(rename = "clean-targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,

    #[serde(rename = "contract-table", default = "default_contract_table")]
    #[validate(custom(function = "validate_identifier"))]
    pub contract_table: String,

    #[serde(default)]
    #[validate(nested)]
    pub gate: GatePolicy,

    #[serde(default = "default_tracked_codes")]
    #[validate(length(min = 1), nested)]
    pub tracked_codes: Vec<TrackedCode>,
}

fn re_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

fn re_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:\-]*$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Names that end up as table or column names in generated SQL.
pub fn is_identifier(value: &str) -> bool {
    re_identifier().is_match(value)
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(ValidationError::new("identifier"))
    }
}

fn validate_code(value: &str) -> Result<(), ValidationError> {
    if re_code().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("code"))
    }
}

pub fn default_tracked_codes() -> Vec<TrackedCode> {
    DEFAULT_TRACKED_CODES
        .iter()
        .map(|(code, name)| TrackedCode {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}

fn default_database_path() -> String {
    "target/medallion.duckdb".to_string()
}
fn default_data_path() -> String {
    "data".to_string()
}
fn default_transform_path() -> String {
    "transforms".to_string()
}
fn default_model_paths() -> Vec<String> {
    vec!["models".to_string()]
}
fn default_config_paths() -> Vec<String> {
    vec!["config".to_string()]
}
fn default_clean_targets() -> Vec<String> {
    vec!["target".to_string()]
}
fn default_target_path() -> String {
    "target".to_string()
}
fn default_contract_table() -> String {
    DEFAULT_CONTRACT_TABLE.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: ProjectConfig =
            serde_yaml::from_str("name: demo\nversion: \"1.0\"\n").unwrap();
        assert_eq!(config.contract_table, "raw_resources");
        assert_eq!(config.model_paths, vec!["models".to_string()]);
        assert_eq!(config.gate, GatePolicy::default());
        assert_eq!(config.tracked_codes.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tracked_codes_override() {
        let yaml = r#"
name: demo
version: "1.0"
tracked_codes:
  - { code: "8867-4", name: heart_rate }
gate:
  null_rate_threshold_pct: 2.5
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tracked_codes.len(), 1);
        assert_eq!(config.gate.null_rate_threshold_pct, 2.5);
        assert_eq!(config.gate.critical_columns.len(), 2);
    }

    #[test]
    fn test_tracked_code_name_must_be_identifier() {
        let yaml = r#"
name: demo
version: "1.0"
tracked_codes:
  - { code: "8867-4", name: "heart rate" }
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tracked_code_with_quote_fails_validation() {
        let yaml = r#"
name: demo
version: "1.0"
tracked_codes:
  - { code: "8867-4' OR 1=1 --", name: heart_rate }
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());

        let snomed: ProjectConfig = serde_yaml::from_str(
            "name: demo\nversion: \"1.0\"\ntracked_codes:\n  - { code: \"364075005\", name: hr }\n",
        )
        .unwrap();
        assert!(snomed.validate().is_ok());
    }

    #[test]
    fn test_empty_tracked_codes_fail_validation() {
        let yaml = "name: demo\nversion: \"1.0\"\ntracked_codes: []\n";
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
