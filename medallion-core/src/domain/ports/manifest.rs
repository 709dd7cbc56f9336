use crate::domain::error::DomainError;
use crate::domain::project::Manifest;
use crate::domain::project::configuration::ProjectConfig;
use crate::domain::transform::TransformUnit;
use std::path::Path;

/// Reads model and derived-table declarations.
pub trait ManifestLoader: Send + Sync {
    fn load(&self, root: &Path, config: &ProjectConfig) -> Result<Manifest, DomainError>;
}

/// Reads the transform units, unrendered.
pub trait TransformSource: Send + Sync {
    fn load_units(
        &self,
        root: &Path,
        config: &ProjectConfig,
    ) -> Result<Vec<TransformUnit>, DomainError>;
}
