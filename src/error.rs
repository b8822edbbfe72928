//! Typed build failures.
//!
//! Every error names the paths or patterns it searched so the user can fix
//! the installation or configuration without digging through debug logs.

use std::path::Path;

use thiserror::Error;

/// Error raised while driving an NDK build.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing user configuration (NDK path, makefile overrides,
    /// unknown architecture names).
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A toolchain or artifact could not be located.
    #[error("resolution error: {message}")]
    Resolution { message: String },

    /// The external build tool failed, or a required NDK binary is absent.
    #[error("execution error: {message}")]
    Execution { message: String },

    /// Compiled output did not match what the build was expected to produce.
    #[error("build output error: {message}")]
    BuildOutput { message: String },

    /// Archive extraction or file bookkeeping failed.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Error::Resolution {
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution {
            message: message.into(),
        }
    }

    pub fn build_output(message: impl Into<String>) -> Self {
        Error::BuildOutput {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it concerned.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source,
        }
    }

    /// Convenience for "failed to <verb> <path>" I/O wrapping.
    pub fn io_path(verb: &str, path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            message: format!("failed to {} {}", verb, path.display()),
            source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            message: "I/O error".to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
