//! Build-variable capture side channel.
//!
//! The ndk-build scripting model offers no query API for the variable values
//! a build actually ran with. The one mechanism available is to make the
//! generated makefile itself write them out: a preamble of `$(shell echo ...)`
//! directives appends each variable of interest to a capture file named
//! through the environment, and the file is read back after the external
//! build exits.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Environment variable carrying the capture file path into the build.
pub const CAPTURE_FILE_ENV: &str = "GANTRY_MAKEFILE_CAPTURE";

/// Variables captured from the build, in emission order.
pub const CAPTURED_VARIABLES: &[&str] = &[
    "LOCAL_C_INCLUDES",
    "LOCAL_PATH",
    "LOCAL_MODULE",
    "LOCAL_MODULE_FILENAME",
    "LOCAL_CFLAGS",
    "LOCAL_SHARED_LIBRARIES",
    "LOCAL_STATIC_LIBRARIES",
    "LOCAL_EXPORT_C_INCLUDES",
    "LOCAL_SRC_FILES",
];

/// Append the capture preamble to a makefile under construction.
///
/// The first directive truncates the capture file so a re-run never reads a
/// stale value; the rest append.
pub fn write_preamble(makefile: &mut String) {
    for (index, variable) in CAPTURED_VARIABLES.iter().enumerate() {
        let redirect = if index == 0 { ">" } else { ">>" };
        makefile.push_str(&format!(
            "$(shell echo \"{var}=$({var})\" {redirect} $({capture}))\n",
            var = variable,
            redirect = redirect,
            capture = CAPTURE_FILE_ENV,
        ));
    }
}

/// Variable values read back from a capture file.
#[derive(Debug, Clone, Default)]
pub struct CapturedVariables {
    values: BTreeMap<String, String>,
}

impl CapturedVariables {
    /// Parse a capture file of `KEY=value` lines. Later occurrences of a key
    /// win: the build appends once per makefile evaluation and the last
    /// evaluation holds the active values.
    pub fn read(path: &Path) -> Result<CapturedVariables> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::io_path("read capture file", path, e))?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> CapturedVariables {
        let mut values = BTreeMap::new();
        for line in contents.lines() {
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        CapturedVariables { values }
    }

    pub fn get(&self, variable: &str) -> Option<&str> {
        self.values.get(variable).map(String::as_str)
    }

    /// The include directories the last-evaluated module compiled with.
    pub fn local_c_includes(&self) -> Vec<String> {
        self.get("LOCAL_C_INCLUDES")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
