//! High-level build operations invoked by the CLI.

pub mod clean;
pub mod collect;
pub mod ndk_build;

pub use clean::{clean, CleanOptions};
pub use collect::{AttachedArtifact, OutputCollector};
pub use ndk_build::{ndk_build, BuildErrorClassifier, BuildOptions, BuildOutcome};
