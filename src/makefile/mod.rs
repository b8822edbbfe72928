//! Android.mk-style build descriptor generation.
//!
//! This module owns the hardest part of the build: turning an arbitrary
//! resolved dependency set into a correct, deterministic makefile, together
//! with the side bookkeeping the external build needs (linkage name lists,
//! materialized include directories, the variable-capture side channel).

pub mod capture;
pub mod generator;
pub mod headers;

pub use capture::{CapturedVariables, CAPTURE_FILE_ENV};
pub use generator::{Makefile, MakefileGenerator, MakefileRequest};
pub use headers::HeaderMaterializer;
