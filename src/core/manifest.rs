//! Project manifest (`Gantry.toml`) parsing.
//!
//! The manifest binds everything the build needs that the host tool would
//! otherwise inject: project identity, NDK settings, the resolved native
//! dependency set, header-export directives and additionally built modules.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::artifact::{ArtifactKind, ArtifactSpec, NativeArtifact};
use crate::ndk::ToolchainMap;
use crate::sources::ArtifactStore;

/// The manifest file name.
pub const MANIFEST_FILE: &str = "Gantry.toml";

/// Parsed `Gantry.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: ProjectSection,

    #[serde(default)]
    pub ndk: NdkSection,

    /// Resolved native dependencies, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,

    /// Header-files directives for the exported header archive.
    #[serde(default)]
    pub headers: Vec<HeaderDirective>,

    /// Additionally built modules to collect after the build.
    #[serde(default)]
    pub modules: Vec<AdditionalModule>,
}

/// `[project]`: identity of the library being built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    pub group: String,
    pub name: String,
    pub version: String,

    /// `so` (shared) or `a` (static); decides the output extension searched
    /// for and the kind attached artifacts are tagged with.
    #[serde(default = "default_packaging")]
    pub packaging: ArtifactKind,

    /// Extra classifier appended to the architecture tag of attached
    /// artifacts.
    #[serde(default)]
    pub classifier: Option<String>,
}

fn default_packaging() -> ArtifactKind {
    ArtifactKind::SharedLib
}

/// `[ndk]`: everything steering the ndk-build invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NdkSection {
    /// NDK installation root; `ANDROID_NDK_HOME` is the fallback.
    pub path: Option<PathBuf>,

    /// Override for the ndk-build executable itself.
    pub ndk_build_executable: Option<String>,

    /// Space-separated target architecture names.
    pub architectures: Option<String>,

    /// Architecture assumed for dependencies without a classifier.
    pub default_architecture: String,

    /// Folder the makefiles are constructed in.
    pub build_directory: PathBuf,

    /// `NDK_LIBS_OUT`, where shared libraries land.
    pub libraries_directory: PathBuf,

    /// `NDK_OUT`, where object files and static libraries land.
    pub objects_directory: PathBuf,

    /// Folder ndk-build is executed in (the `-C` flag).
    pub working_directory: Option<PathBuf>,

    /// Resolve and export header archives for dependencies.
    pub use_header_archives: bool,

    /// Leave materialized include directories behind after the build.
    pub preserve_build_artifacts: bool,

    /// Bundle and attach the exported headers as a `.har` artifact.
    pub attach_header_files: bool,

    /// Attach the compiled libraries as build artifacts.
    pub attach_libraries: bool,

    /// Derive header directives from the captured `LOCAL_C_INCLUDES`
    /// instead of `[[headers]]`.
    pub use_local_src_include_paths: bool,

    /// Never fail the build on stderr output alone.
    pub ignore_build_warnings: bool,

    /// Full-match pattern for stderr lines that are warnings, not errors.
    pub build_warnings_pattern: String,

    /// Explicit `NDK_TOOLCHAIN` override, skipping resolution entirely.
    pub ndk_toolchain: Option<String>,

    /// Final library name override (no `lib` prefix, no extension).
    pub final_library_name: Option<String>,

    /// Attach every matching produced library instead of exactly one.
    pub allow_multi_artifacts: bool,

    /// Pass `-j <cores>` to ndk-build.
    pub max_jobs: bool,

    /// Make target to invoke (defaults to `all`).
    pub target: Option<String>,

    /// Custom `APP_BUILD_SCRIPT` makefile, relative to the project root.
    pub makefile: Option<String>,

    /// Custom `NDK_APPLICATION_MK`, relative to the project root.
    pub application_makefile: Option<String>,

    /// Extra ndk-build command line, split on whitespace.
    pub additional_args: Option<String>,

    /// Skip the native build entirely.
    pub skip: bool,

    /// Architecture family -> toolchain overrides.
    pub toolchains: ToolchainMap,

    /// Extra environment passed to the ndk-build subprocess.
    pub env: std::collections::BTreeMap<String, String>,
}

impl Default for NdkSection {
    fn default() -> Self {
        NdkSection {
            path: None,
            ndk_build_executable: None,
            architectures: None,
            default_architecture: "armeabi".to_string(),
            build_directory: PathBuf::from("target/ndk-build"),
            libraries_directory: PathBuf::from("target/ndk-libs"),
            objects_directory: PathBuf::from("target/obj"),
            working_directory: None,
            use_header_archives: true,
            preserve_build_artifacts: false,
            attach_header_files: true,
            attach_libraries: true,
            use_local_src_include_paths: false,
            ignore_build_warnings: true,
            build_warnings_pattern: ".*(warning|note): .*".to_string(),
            ndk_toolchain: None,
            final_library_name: None,
            allow_multi_artifacts: false,
            max_jobs: false,
            target: None,
            makefile: None,
            application_makefile: None,
            additional_args: None,
            skip: false,
            toolchains: ToolchainMap::default(),
            env: std::collections::BTreeMap::new(),
        }
    }
}

/// One `[[dependencies]]` entry: coordinates plus an optional explicit file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub group: String,
    pub name: String,
    pub version: String,

    /// Artifact type tag: `a`, `so`, `apklib`, `aar`.
    #[serde(rename = "type")]
    pub kind: ArtifactKind,

    #[serde(default)]
    pub classifier: Option<String>,

    /// Backing file; resolved through the local repository when omitted.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// One `[[headers]]` directive selecting files for the header archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderDirective {
    pub directory: PathBuf,

    #[serde(default = "default_header_includes")]
    pub includes: Vec<String>,

    #[serde(default)]
    pub excludes: Vec<String>,
}

fn default_header_includes() -> Vec<String> {
    vec!["**/*.h".to_string()]
}

/// One `[[modules]]` entry naming an additionally built module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalModule {
    pub name: String,
    pub classifier: String,
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn load(path: &Path) -> Result<Manifest> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let manifest: Manifest = toml::from_str(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Find `Gantry.toml` in `dir` and load it.
    pub fn load_from_dir(dir: &Path) -> Result<Manifest> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            bail!(
                "no {} found in {}\nhelp: run from the project root",
                MANIFEST_FILE,
                dir.display()
            );
        }
        Manifest::load(&path)
    }

    fn validate(&self) -> Result<()> {
        match self.project.packaging {
            ArtifactKind::SharedLib | ArtifactKind::StaticLib => {}
            other => bail!(
                "unsupported packaging `{}`; native builds produce `so` or `a`",
                other
            ),
        }
        for entry in &self.dependencies {
            if entry.kind == ArtifactKind::HeaderArchive {
                bail!(
                    "dependency {}:{} declares type `har`; header archives are \
                     resolved automatically alongside their binary",
                    entry.group,
                    entry.name
                );
            }
        }
        Ok(())
    }

    /// Materialize the dependency set, in declaration order.
    ///
    /// Entries without an explicit file are resolved through `store`.
    /// Entries naming the project itself are skipped with a warning: they
    /// are leftovers of a previous run attaching its own outputs.
    pub fn native_artifacts(
        &self,
        project_dir: &Path,
        store: &dyn ArtifactStore,
    ) -> crate::error::Result<Vec<NativeArtifact>> {
        let mut artifacts = Vec::with_capacity(self.dependencies.len());

        for entry in &self.dependencies {
            if entry.group == self.project.group && entry.name == self.project.name {
                tracing::warn!(
                    "excluding dependency {}:{} attached by this build",
                    entry.group,
                    entry.name
                );
                continue;
            }

            let file = match &entry.file {
                Some(file) if file.is_absolute() => file.clone(),
                Some(file) => project_dir.join(file),
                None => store.resolve(&ArtifactSpec {
                    group: entry.group.clone(),
                    name: entry.name.clone(),
                    version: entry.version.clone(),
                    kind: entry.kind,
                    classifier: entry.classifier.clone(),
                })?,
            };

            artifacts.push(NativeArtifact::new(
                entry.group.clone(),
                entry.name.clone(),
                entry.version.clone(),
                entry.kind,
                entry.classifier.clone(),
                file,
            ));
        }

        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticStore;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[project]
group = "com.example"
name = "hello-jni"
version = "1.0.0"
"#;

    #[test]
    fn test_minimal_manifest_defaults() {
        let manifest: Manifest = toml::from_str(MINIMAL).unwrap();
        assert_eq!(manifest.project.packaging, ArtifactKind::SharedLib);
        assert_eq!(manifest.ndk.default_architecture, "armeabi");
        assert!(manifest.ndk.use_header_archives);
        assert!(manifest.ndk.ignore_build_warnings);
        assert!(!manifest.ndk.allow_multi_artifacts);
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_full_ndk_section() {
        let manifest: Manifest = toml::from_str(
            r#"
[project]
group = "com.example"
name = "hello-jni"
version = "1.0.0"
packaging = "a"

[ndk]
architectures = "armeabi-v7a x86_64"
use-header-archives = false
final-library-name = "hello"
max-jobs = true

[ndk.toolchains]
x86 = "x86-4.7"

[ndk.env]
BUILD_TARGET = "android"

[[dependencies]]
group = "com.example.deps"
name = "libfoo"
version = "2.0"
type = "a"
classifier = "armeabi-v7a"
file = "prebuilt/libfoo.a"

[[headers]]
directory = "jni/include"

[[modules]]
name = "extra"
classifier = "tools"
"#,
        )
        .unwrap();

        assert_eq!(manifest.project.packaging, ArtifactKind::StaticLib);
        assert_eq!(
            manifest.ndk.architectures.as_deref(),
            Some("armeabi-v7a x86_64")
        );
        assert_eq!(manifest.ndk.toolchains.get("x86"), Some("x86-4.7"));
        assert_eq!(manifest.ndk.env.get("BUILD_TARGET").unwrap(), "android");
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(manifest.dependencies[0].kind, ArtifactKind::StaticLib);
        assert_eq!(manifest.headers[0].includes, vec!["**/*.h"]);
        assert_eq!(manifest.modules[0].classifier, "tools");
    }

    #[test]
    fn test_har_dependency_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_FILE);
        std::fs::write(
            &path,
            format!(
                "{}\n[[dependencies]]\ngroup = \"g\"\nname = \"n\"\nversion = \"1\"\ntype = \"har\"\n",
                MINIMAL
            ),
        )
        .unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(err.to_string().contains("har"));
    }

    #[test]
    fn test_native_artifacts_filters_self_and_resolves_relative() {
        let tmp = TempDir::new().unwrap();
        let manifest: Manifest = toml::from_str(&format!(
            "{}\n\
             [[dependencies]]\n\
             group = \"com.example\"\nname = \"hello-jni\"\nversion = \"1.0.0\"\ntype = \"so\"\n\
             file = \"self.so\"\n\
             [[dependencies]]\n\
             group = \"com.example.deps\"\nname = \"libfoo\"\nversion = \"2.0\"\ntype = \"a\"\n\
             file = \"prebuilt/libfoo.a\"\n",
            MINIMAL
        ))
        .unwrap();

        let store = StaticStore::new();
        let artifacts = manifest.native_artifacts(tmp.path(), &store).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "libfoo");
        assert_eq!(artifacts[0].file(), tmp.path().join("prebuilt/libfoo.a"));
    }
}
