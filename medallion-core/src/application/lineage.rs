// medallion-core/src/application/lineage.rs
//
// Static lineage: contract table -> derived tables -> models, read from the
// declarations only. Nothing is executed.

use serde::{Deserialize, Serialize};

use crate::domain::project::manifest::Manifest;

// ── Report Structures ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageKind {
    Contract,
    DerivedTable,
    Model,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineageReport {
    pub project_name: String,
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
    pub violations: Vec<LineageViolation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineageNode {
    pub name: String,
    pub kind: LineageKind,
    /// Columns that identify a row (models only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grain: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineageEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineageViolation {
    pub model: String,
    pub upstream: String,
    pub message: String,
}

impl LineageReport {
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_mermaid(&self) -> String {
        let mut lines = Vec::new();
        lines.push("graph LR".to_string());

        for node in &self.nodes {
            let line = match node.kind {
                LineageKind::Contract => format!("    {}[(\"{}\")]", node.name, node.name),
                LineageKind::DerivedTable => format!("    {}[[{}]]", node.name, node.name),
                LineageKind::Model if node.grain.is_empty() => {
                    format!("    {}[{}]", node.name, node.name)
                }
                LineageKind::Model => format!(
                    "    {}[\"{} (grain: {})\"]",
                    node.name,
                    node.name,
                    node.grain.join(", ")
                ),
            };
            lines.push(line);
        }

        for edge in &self.edges {
            lines.push(format!("    {} --> {}", edge.from, edge.to));
        }

        for v in &self.violations {
            lines.push(format!("    style {} fill:#ff6b6b,stroke:#c0392b", v.model));
        }

        lines.join("\n")
    }
}

// ── Analyzer ─────────────────────────────────────────────────────────

pub struct LineageAnalyzer;

impl LineageAnalyzer {
    /// Every declared table hangs off the contract table; every model hangs off
    /// what it reads. Output is sorted.
    pub fn analyze(manifest: &Manifest, contract_table: &str) -> LineageReport {
        let mut nodes = vec![LineageNode {
            name: contract_table.to_string(),
            kind: LineageKind::Contract,
            grain: vec![],
        }];
        let mut edges = Vec::new();
        let mut violations = Vec::new();

        for name in manifest.tables.keys() {
            nodes.push(LineageNode {
                name: name.clone(),
                kind: LineageKind::DerivedTable,
                grain: vec![],
            });
            edges.push(LineageEdge {
                from: contract_table.to_string(),
                to: name.clone(),
            });
        }

        for (name, node) in &manifest.nodes {
            nodes.push(LineageNode {
                name: name.clone(),
                kind: LineageKind::Model,
                grain: node.grain.clone(),
            });

            for upstream in manifest.upstreams(node) {
                let declared = manifest.tables.contains_key(upstream)
                    || manifest.nodes.contains_key(upstream);
                if !declared {
                    violations.push(LineageViolation {
                        model: name.clone(),
                        upstream: upstream.clone(),
                        message: format!(
                            "Model '{}' reads '{}', which is neither a declared table nor a model.",
                            name, upstream
                        ),
                    });
                    continue;
                }
                edges.push(LineageEdge {
                    from: upstream.clone(),
                    to: name.clone(),
                });
            }
        }

        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        violations.sort_by(|a, b| (&a.model, &a.upstream).cmp(&(&b.model, &b.upstream)));

        LineageReport {
            project_name: manifest.project_name.clone(),
            nodes,
            edges,
            violations,
        }
    }
}
