// medallion-core/src/application/clean.rs

use std::fs;
use std::path::Path;

use crate::error::MedallionError;
use crate::infrastructure::config::project::load_project_config;
use crate::infrastructure::fs::resolve_within;

/// Removes the configured clean targets. Returns what was actually removed.
pub fn clean_project(project_dir: &Path) -> Result<Vec<String>, MedallionError> {
    tracing::info!("🧹 Initializing cleanup sequence...");

    let config = load_project_config(project_dir)?;

    let targets = if config.clean_targets.is_empty() {
        vec![config.target_path.clone()]
    } else {
        config.clean_targets
    };

    let mut removed = Vec::new();
    for target_rel_path in targets {
        // Path traversal guard: only paths inside the project
        let full_path = resolve_within(project_dir, &target_rel_path)
            .ok_or_else(|| MedallionError::UnsafePath(target_rel_path.clone()))?;

        if full_path.exists() {
            if full_path.is_dir() {
                fs::remove_dir_all(&full_path)?;
            } else {
                fs::remove_file(&full_path)?;
            }
            println!("   🗑️  Artifact removed: {}", target_rel_path);
            removed.push(target_rel_path);
        }
    }

    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clean_removes_targets() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("medallion.yaml"), "name: icu\nversion: \"1.0\"\n").unwrap();
        fs::create_dir_all(dir.path().join("target/compiled")).unwrap();

        let removed = clean_project(dir.path()).unwrap();
        assert_eq!(removed, vec!["target".to_string()]);
        assert!(!dir.path().join("target").exists());
    }

    #[test]
    fn test_clean_refuses_traversal() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("medallion.yaml"),
            "name: icu\nversion: \"1.0\"\nclean-targets: [\"../elsewhere\"]\n",
        )
        .unwrap();

        assert!(matches!(
            clean_project(dir.path()),
            Err(MedallionError::UnsafePath(_))
        ));
    }
}
