//! Core data model: architectures, artifacts, and the project manifest.

pub mod architecture;
pub mod artifact;
pub mod manifest;

pub use architecture::{parse_architectures, AbiFamily, NDK_ARCHITECTURES};
pub use artifact::{ArtifactKind, ArtifactSpec, DependencyClass, Linkage, NativeArtifact};
pub use manifest::Manifest;
