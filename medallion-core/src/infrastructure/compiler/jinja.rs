// medallion-core/src/infrastructure/compiler/jinja.rs

// Turns templated SQL ({{ ref() }}, {{ source() }}, {{ tracked_codes }}) into SQL
// the store can execute.

use minijinja::{Environment, UndefinedBehavior, Value};

use crate::application::ports::TemplateEngine;
use crate::error::MedallionError;
use crate::infrastructure::error::InfrastructureError;

pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // A typo in a variable name must not render as an empty string
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        // source('stg_vitals') -> "stg_vitals": a declared derived table
        env.add_function("source", |name: String| -> String {
            format!("\"{}\"", name)
        });
        // ref('vitals_wide') -> "vitals_wide": another model
        env.add_function("ref", |model_name: String| -> String {
            format!("\"{}\"", model_name)
        });

        env.add_filter("sql_list", sql_list);
        env.add_filter("sql_literal", sql_literal);

        Self { env }
    }
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// `"O'Brien" | sql_literal` -> `'O''Brien'`
fn sql_literal(value: Value) -> String {
    let text = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    format!("'{}'", text.replace('\'', "''"))
}

/// `['a', 'b'] | sql_list` -> `'a', 'b'`, quotes escaped. Meant for `IN (...)`.
fn sql_list(value: Value) -> Result<String, minijinja::Error> {
    let mut items = Vec::new();
    for item in value.try_iter()? {
        items.push(sql_literal(item));
    }
    Ok(items.join(", "))
}

impl TemplateEngine for JinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, MedallionError> {
        self.env
            .render_str(template, context)
            .map_err(|e| MedallionError::Infrastructure(InfrastructureError::TemplateError(e)))
    }
}
