//! Gantry - a dependency-graph-driven native build driver for the Android NDK
//!
//! This crate provides the core library functionality for Gantry: toolchain
//! and debug-server resolution against an NDK installation, makefile
//! synthesis from a resolved native dependency set, and collection of the
//! compiled, architecture-tagged build artifacts.

pub mod core;
pub mod error;
pub mod extract;
pub mod makefile;
pub mod ndk;
pub mod ops;
pub mod sources;
pub mod util;

pub use crate::core::{
    architecture::AbiFamily, artifact::ArtifactKind, artifact::NativeArtifact, manifest::Manifest,
};

pub use crate::error::{Error, Result};
pub use crate::makefile::{Makefile, MakefileGenerator};
pub use crate::ndk::{AndroidNdk, ToolchainMap};
