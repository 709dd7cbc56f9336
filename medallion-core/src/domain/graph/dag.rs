// medallion-core/src/domain/graph/dag.rs

use crate::domain::error::DomainError;
use crate::domain::project::Manifest;
use std::collections::{BTreeMap, VecDeque};

pub struct GraphSolver;

impl GraphSolver {
    /// Calculates the build order of models (Topological Sort with Layers).
    /// Layer N depends only on layers 0..N-1; each layer is sorted by name so the
    /// plan is identical from one run to the next.
    pub fn plan_execution(manifest: &Manifest) -> Result<Vec<Vec<String>>, DomainError> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut adj_list: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        // 1. Initialization: every model is a vertex
        for node_name in manifest.nodes.keys() {
            in_degree.insert(node_name, 0);
            adj_list.insert(node_name, Vec::new());
        }

        // 2. Edges upstream -> downstream (sources are not vertices)
        for (node_name, node) in &manifest.nodes {
            for dep_name in &node.refs {
                if manifest.nodes.contains_key(dep_name) {
                    adj_list
                        .entry(dep_name.as_str())
                        .or_default()
                        .push(node_name.as_str());

                    *in_degree.entry(node_name.as_str()).or_insert(0) += 1;
                }
            }
        }

        // 3. Kahn's Algorithm (Layered)
        let mut layers: Vec<Vec<String>> = Vec::new();
        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut total_resolved = 0;

        while !queue.is_empty() {
            let mut current_layer: Vec<String> = Vec::new();
            let layer_size = queue.len();

            for _ in 0..layer_size {
                if let Some(current) = queue.pop_front() {
                    current_layer.push(current.to_string());
                    total_resolved += 1;

                    if let Some(neighbors) = adj_list.get(current) {
                        for neighbor in neighbors {
                            if let Some(degree) = in_degree.get_mut(neighbor) {
                                *degree -= 1;
                                if *degree == 0 {
                                    queue.push_back(*neighbor);
                                }
                            }
                        }
                    }
                }
            }
            current_layer.sort();
            layers.push(current_layer);
        }

        // 4. Cycle Detection
        if total_resolved != manifest.nodes.len() {
            let stuck: Vec<&str> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(name, _)| *name)
                .collect();
            return Err(DomainError::CircularDependency(format!(
                "{} (resolved {}/{} models)",
                stuck.join(", "),
                total_resolved,
                manifest.nodes.len()
            )));
        }

        Ok(layers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::project::{ManifestNode, NodeConfig};
    use anyhow::Result;
    use std::collections::BTreeMap;

    fn create_mock_node(name: &str, refs: Vec<&str>) -> ManifestNode {
        ManifestNode {
            name: name.to_string(),
            path: std::path::PathBuf::from("mock.sql"),
            schema_path: None,
            raw_sql: "".to_string(),
            refs: refs.iter().map(|s| s.to_string()).collect(),
            sources: vec![],
            config: NodeConfig::default(),
            grain: vec![],
            description: None,
            columns: vec![],
        }
    }

    fn manifest_of(nodes: Vec<ManifestNode>) -> Manifest {
        Manifest {
            project_name: "test".into(),
            nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
            tables: BTreeMap::new(),
        }
    }

    #[test]
    fn test_dag_linear() -> Result<()> {
        // wide <- enriched <- daily
        let manifest = manifest_of(vec![
            create_mock_node("vitals_wide", vec![]),
            create_mock_node("vitals_enriched", vec!["vitals_wide"]),
            create_mock_node("vitals_daily", vec!["vitals_enriched"]),
        ]);

        let plan = GraphSolver::plan_execution(&manifest)?;
        assert_eq!(
            plan,
            vec![
                vec!["vitals_wide".to_string()],
                vec!["vitals_enriched".to_string()],
                vec!["vitals_daily".to_string()],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_dag_layers_sorted() -> Result<()> {
        let manifest = manifest_of(vec![
            create_mock_node("zeta", vec![]),
            create_mock_node("alpha", vec![]),
            create_mock_node("mid", vec!["zeta", "alpha"]),
        ]);

        let plan = GraphSolver::plan_execution(&manifest)?;
        assert_eq!(plan[0], vec!["alpha".to_string(), "zeta".to_string()]);
        assert_eq!(plan[1], vec!["mid".to_string()]);
        Ok(())
    }

    #[test]
    fn test_dag_cycle_error() {
        let manifest = manifest_of(vec![
            create_mock_node("model_a", vec!["model_b"]),
            create_mock_node("model_b", vec!["model_a"]),
        ]);

        let result = GraphSolver::plan_execution(&manifest);
        assert!(matches!(result, Err(DomainError::CircularDependency(_))));
    }
}
