//! Android NDK installation handling.
//!
//! Wraps one NDK root directory and answers the two questions the build
//! needs from it: which installed toolchain to use for an architecture, and
//! where the prebuilt debug server for that architecture lives. Installation
//! layouts vary across NDK releases, so both answers come from probing a
//! priority-ordered candidate list rather than trusting any single layout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::architecture::AbiFamily;
use crate::error::{Error, Result};

/// Environment variable consulted when no NDK path is configured.
pub const ENV_ANDROID_NDK_HOME: &str = "ANDROID_NDK_HOME";

const NDK_PATH_HELP: &str = "set [ndk] path in Gantry.toml, pass --ndk-path, \
     or export ANDROID_NDK_HOME";

/// User override: architecture family name -> fixed toolchain name.
///
/// A mapped toolchain is trusted and returned without any filesystem check,
/// so users can point the build at layouts the candidate scan does not know.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolchainMap {
    map: HashMap<String, String>,
}

impl ToolchainMap {
    pub fn new() -> Self {
        ToolchainMap::default()
    }

    pub fn insert(&mut self, family: impl Into<String>, toolchain: impl Into<String>) {
        self.map.insert(family.into(), toolchain.into());
    }

    pub fn get(&self, family: &str) -> Option<&str> {
        self.map.get(family).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// An Android NDK installation.
#[derive(Debug, Clone)]
pub struct AndroidNdk {
    root: PathBuf,
}

impl AndroidNdk {
    /// Wrap an NDK root, failing fast when it is not a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::configuration(format!(
                "NDK path {} is not a directory; {}",
                root.display(),
                NDK_PATH_HELP
            )));
        }
        Ok(AndroidNdk { root })
    }

    /// Locate the NDK from an explicit path or the environment.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return AndroidNdk::new(path);
        }
        match std::env::var_os(ENV_ANDROID_NDK_HOME) {
            Some(value) if !value.is_empty() => AndroidNdk::new(PathBuf::from(value)),
            _ => Err(Error::configuration(format!(
                "no Android NDK path configured; {}",
                NDK_PATH_HELP
            ))),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `ndk-build` entry point for this platform.
    pub fn ndk_build_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("ndk-build.cmd")
        } else {
            self.root.join("ndk-build")
        }
    }

    /// Resolve the toolchain to build an architecture with.
    ///
    /// A mapping hit wins unconditionally. Otherwise the family's candidate
    /// list is scanned in preference order and the first candidate with an
    /// installed `toolchains/<name>` directory is selected.
    pub fn resolve_toolchain(
        &self,
        architecture: &str,
        mappings: Option<&ToolchainMap>,
    ) -> Result<String> {
        let family = family_for(architecture)?;

        if let Some(mapped) = mappings.and_then(|m| m.get(family.name)) {
            tracing::debug!(
                architecture,
                toolchain = mapped,
                "using mapped toolchain, skipping candidate scan"
            );
            return Ok(mapped.to_string());
        }

        self.first_installed_toolchain(family)
    }

    /// Scan a family's candidates under `toolchains/` for the first one
    /// installed, rejecting an installed-but-unreadable directory outright.
    fn first_installed_toolchain(&self, family: &AbiFamily) -> Result<String> {
        for candidate in family.toolchains {
            let dir = self.toolchain_dir(candidate);
            if dir.exists() {
                validate_toolchain_dir(&dir)?;
                tracing::debug!(toolchain = %candidate, "selected installed toolchain");
                return Ok(candidate.to_string());
            }
        }

        Err(Error::resolution(format!(
            "no supported {} toolchain found under {}",
            family.name,
            self.root.join("toolchains").display()
        )))
    }

    fn toolchain_dir(&self, name: &str) -> PathBuf {
        self.root.join("toolchains").join(name)
    }

    /// Locate the prebuilt debug server binary for an architecture.
    ///
    /// Candidate folder names are the family's debugger ABI tag followed by
    /// every toolchain candidate; each is probed against the two layouts NDK
    /// releases have used, older first.
    pub fn debug_server(&self, architecture: &str) -> Result<PathBuf> {
        let family = family_for(architecture)?;

        let mut locations: Vec<&str> = vec![family.debug_server_tag];
        locations.extend(family.toolchains);

        let layouts: [fn(&str) -> String; 2] = [
            |loc| format!("toolchains/{}/prebuilt/gdbserver", loc),
            |loc| format!("prebuilt/{}/gdbserver/gdbserver", loc),
        ];
        for pattern in layouts {
            for &location in &locations {
                let candidate = self.root.join(pattern(location));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        Err(Error::execution(format!(
            "debug server binary for architecture {} does not exist under {}; \
             double-check the toolchain and NDK release used",
            architecture,
            self.root.display()
        )))
    }
}

fn family_for(architecture: &str) -> Result<&'static AbiFamily> {
    AbiFamily::for_architecture(architecture).ok_or_else(|| {
        Error::configuration(format!(
            "unsupported architecture `{}`; known architectures are {}",
            architecture,
            crate::core::architecture::NDK_ARCHITECTURES.join(", ")
        ))
    })
}

fn validate_toolchain_dir(dir: &Path) -> Result<()> {
    // An installed but unreadable directory is a broken installation, not a
    // missing toolchain.
    if std::fs::read_dir(dir).is_err() {
        return Err(Error::configuration(format!(
            "toolchain directory {} exists but can not be read",
            dir.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ndk_with_toolchains(names: &[&str]) -> (TempDir, AndroidNdk) {
        let tmp = TempDir::new().unwrap();
        for name in names {
            fs::create_dir_all(tmp.path().join("toolchains").join(name)).unwrap();
        }
        let ndk = AndroidNdk::new(tmp.path()).unwrap();
        (tmp, ndk)
    }

    #[test]
    fn test_rejects_missing_root() {
        let err = AndroidNdk::new("/nonexistent/ndk/root").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("/nonexistent/ndk/root"));
    }

    #[test]
    fn test_mapping_bypasses_existence_check() {
        let (_tmp, ndk) = ndk_with_toolchains(&[]);
        let mut map = ToolchainMap::new();
        map.insert("x86", "x86-9.9");

        // No such directory exists, the mapping is still honored.
        let resolved = ndk.resolve_toolchain("x86", Some(&map)).unwrap();
        assert_eq!(resolved, "x86-9.9");
    }

    #[test]
    fn test_candidate_preference_order() {
        let (_tmp, ndk) = ndk_with_toolchains(&["x86-4.4.3", "x86-4.6"]);
        let resolved = ndk.resolve_toolchain("x86", None).unwrap();
        assert_eq!(resolved, "x86-4.6");
    }

    #[test]
    fn test_sixty_four_bit_architecture_never_uses_thirty_two_bit_list() {
        // Only a 32-bit x86 toolchain is installed; x86_64 must not pick it.
        let (_tmp, ndk) = ndk_with_toolchains(&["x86-4.6"]);
        let err = ndk.resolve_toolchain("x86_64", None).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));

        let (_tmp, ndk) = ndk_with_toolchains(&["x86-4.6", "x86_64-4.9"]);
        assert_eq!(ndk.resolve_toolchain("x86_64", None).unwrap(), "x86_64-4.9");
        assert_eq!(ndk.resolve_toolchain("x86", None).unwrap(), "x86-4.6");
    }

    #[test]
    fn test_arm64_resolves_aarch64_toolchain() {
        let (_tmp, ndk) =
            ndk_with_toolchains(&["arm-linux-androideabi-4.9", "aarch64-linux-android-4.9"]);
        assert_eq!(
            ndk.resolve_toolchain("arm64-v8a", None).unwrap(),
            "aarch64-linux-android-4.9"
        );
        assert_eq!(
            ndk.resolve_toolchain("armeabi-v7a", None).unwrap(),
            "arm-linux-androideabi-4.9"
        );
    }

    #[test]
    fn test_no_candidate_names_searched_root() {
        let (tmp, ndk) = ndk_with_toolchains(&[]);
        let err = ndk.resolve_toolchain("armeabi", None).unwrap_err();
        assert!(err.to_string().contains("toolchains"));
        assert!(err
            .to_string()
            .contains(&tmp.path().display().to_string()));
    }

    #[test]
    fn test_unknown_architecture_is_configuration_error() {
        let (_tmp, ndk) = ndk_with_toolchains(&[]);
        let err = ndk.resolve_toolchain("sparc", None).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_debug_server_prefers_toolchain_layout() {
        let tmp = TempDir::new().unwrap();
        let in_toolchains = tmp
            .path()
            .join("toolchains/android-arm/prebuilt/gdbserver");
        fs::create_dir_all(in_toolchains.parent().unwrap()).unwrap();
        fs::write(&in_toolchains, b"").unwrap();

        let in_prebuilt = tmp.path().join("prebuilt/android-arm/gdbserver/gdbserver");
        fs::create_dir_all(in_prebuilt.parent().unwrap()).unwrap();
        fs::write(&in_prebuilt, b"").unwrap();

        let ndk = AndroidNdk::new(tmp.path()).unwrap();
        assert_eq!(ndk.debug_server("armeabi-v7a").unwrap(), in_toolchains);
    }

    #[test]
    fn test_debug_server_falls_back_to_prebuilt_layout() {
        let tmp = TempDir::new().unwrap();
        let in_prebuilt = tmp
            .path()
            .join("prebuilt/aarch64-linux-android-4.9/gdbserver/gdbserver");
        fs::create_dir_all(in_prebuilt.parent().unwrap()).unwrap();
        fs::write(&in_prebuilt, b"").unwrap();

        let ndk = AndroidNdk::new(tmp.path()).unwrap();
        assert_eq!(ndk.debug_server("arm64-v8a").unwrap(), in_prebuilt);
    }

    #[test]
    fn test_debug_server_missing_is_execution_error() {
        let (_tmp, ndk) = ndk_with_toolchains(&[]);
        let err = ndk.debug_server("x86").unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
        assert!(err.to_string().contains("x86"));
    }

    #[test]
    fn test_ndk_build_path() {
        let (_tmp, ndk) = ndk_with_toolchains(&[]);
        let path = ndk.ndk_build_path();
        if cfg!(windows) {
            assert!(path.ends_with("ndk-build.cmd"));
        } else {
            assert!(path.ends_with("ndk-build"));
        }
    }
}
