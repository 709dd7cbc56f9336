// src/domain/ports/mod.rs

pub mod manifest;

pub use manifest::{ManifestLoader, TransformSource};
