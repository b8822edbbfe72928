//! Native build descriptor synthesis.
//!
//! Turns the resolved dependency set into the makefile text ndk-build is
//! pointed at: one conditionally guarded prebuilt-library stanza per
//! (artifact, architecture) pair, plus the capture preamble. Every stanza is
//! emitted for every dependency and gated on `TARGET_ARCH_ABI`; the
//! makefile is never filtered by architecture ahead of time, so one
//! generated file serves whichever architecture pass evaluates it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::artifact::{
    ArtifactSpec, DependencyClass, Linkage, NativeArtifact,
};
use crate::error::Result;
use crate::extract::BundleExtractor;
use crate::makefile::capture;
use crate::makefile::headers::HeaderMaterializer;
use crate::sources::ArtifactStore;
use crate::util::hash::Fingerprint;

/// Inputs for one descriptor generation pass.
#[derive(Debug, Clone, Copy)]
pub struct MakefileRequest<'a> {
    /// The resolved dependency set, processed in this order.
    pub artifacts: &'a [NativeArtifact],
    /// Architectures the build will run for; bundles expand once per entry.
    pub architectures: &'a [String],
    /// Architecture assumed for direct artifacts without a classifier.
    pub default_architecture: &'a str,
    /// Materialize header archives and emit export-include directives.
    pub use_header_archives: bool,
    /// Leave materialized include directories behind after the build.
    pub preserve_build_artifacts: bool,
}

/// One stanza's worth of build state, constructed fresh per
/// (artifact, architecture) pair and consumed by emission.
#[derive(Debug, Clone)]
struct LibraryBuildUnit {
    group: String,
    name: String,
    version: String,
    kind_tag: String,
    module: String,
    architecture: String,
    library_path: PathBuf,
    output_name: String,
    linkage: Linkage,
    header_archive: Option<ArtifactSpec>,
}

impl LibraryBuildUnit {
    fn direct(artifact: &NativeArtifact, default_architecture: &str) -> LibraryBuildUnit {
        LibraryBuildUnit {
            group: artifact.group.clone(),
            name: artifact.name.clone(),
            version: artifact.version.clone(),
            kind_tag: artifact.kind.to_string(),
            module: artifact.name.clone(),
            architecture: artifact.architecture(default_architecture),
            library_path: artifact.file().to_path_buf(),
            output_name: output_name(artifact, artifact.file()),
            linkage: artifact.linkage().unwrap_or(Linkage::Shared),
            header_archive: Some(artifact.header_archive(artifact.classifier.clone())),
        }
    }

    fn bundled(
        artifact: &NativeArtifact,
        architecture: &str,
        binary: &Path,
        linkage: Linkage,
    ) -> LibraryBuildUnit {
        // A bundle's header archive is architecture-specific: the classifier
        // is the architecture alone, or architecture-classifier when the
        // bundle itself was classified.
        let har_classifier = match &artifact.classifier {
            Some(original) => format!("{}-{}", architecture, original),
            None => architecture.to_string(),
        };

        LibraryBuildUnit {
            group: artifact.group.clone(),
            name: artifact.name.clone(),
            version: artifact.version.clone(),
            kind_tag: artifact.kind.to_string(),
            module: artifact.name.clone(),
            architecture: architecture.to_string(),
            library_path: binary.to_path_buf(),
            output_name: output_name(artifact, binary),
            linkage,
            header_archive: Some(artifact.header_archive(Some(har_classifier))),
        }
    }
}

fn output_name(artifact: &NativeArtifact, file: &Path) -> String {
    if artifact.name.is_empty() {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        artifact.name.clone()
    }
}

/// The generated build descriptor: script text plus the bookkeeping produced
/// alongside it.
#[derive(Debug)]
pub struct Makefile {
    text: String,
    include_directories: Vec<PathBuf>,
    static_modules: BTreeSet<String>,
    shared_modules: BTreeSet<String>,
    preserve_build_artifacts: bool,
    cleaned: bool,
}

impl Makefile {
    fn new(preserve_build_artifacts: bool) -> Makefile {
        Makefile {
            text: String::from("# Generated by gantry\n"),
            include_directories: Vec::new(),
            static_modules: BTreeSet::new(),
            shared_modules: BTreeSet::new(),
            preserve_build_artifacts,
            cleaned: false,
        }
    }

    /// The makefile text to hand to ndk-build.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Include directories materialized during generation, in creation order.
    pub fn include_directories(&self) -> &[PathBuf] {
        &self.include_directories
    }

    pub fn has_static_libraries(&self) -> bool {
        !self.static_modules.is_empty()
    }

    pub fn has_shared_libraries(&self) -> bool {
        !self.shared_modules.is_empty()
    }

    /// Space-separated static module names, deterministically ordered.
    pub fn static_library_list(&self) -> String {
        self.static_modules
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Space-separated shared module names, deterministically ordered.
    pub fn shared_library_list(&self) -> String {
        self.shared_modules
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Content fingerprint for reproducible-build diffing.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        fp.update_str(&self.text);
        fp.finish_short()
    }

    /// Delete every include directory registered during generation.
    ///
    /// A no-op when preserve-build-artifacts is set. Each directory is
    /// attempted independently; failures are logged and do not stop the
    /// remaining deletions.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        if self.preserve_build_artifacts {
            tracing::debug!("leaving temporary include directories behind");
            return;
        }

        for dir in &self.include_directories {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => tracing::debug!("removed include directory {}", dir.display()),
                Err(e) => {
                    tracing::warn!("failed to remove include directory {}: {}", dir.display(), e)
                }
            }
        }
    }
}

impl Drop for Makefile {
    // Backstop so an early-returning build pass still releases the
    // directories; explicit cleanup() remains the normal path.
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Synthesizes makefiles from resolved dependency sets.
pub struct MakefileGenerator<'a> {
    store: &'a dyn ArtifactStore,
    extractor: &'a dyn BundleExtractor,
    /// Directory include directories are materialized under.
    build_dir: &'a Path,
    /// Directory bundles unpack into.
    unpack_dir: PathBuf,
}

impl<'a> MakefileGenerator<'a> {
    pub fn new(
        store: &'a dyn ArtifactStore,
        extractor: &'a dyn BundleExtractor,
        build_dir: &'a Path,
    ) -> Self {
        MakefileGenerator {
            store,
            extractor,
            build_dir,
            unpack_dir: build_dir.join("unpacked-libs"),
        }
    }

    /// Generate the descriptor for one dependency set.
    ///
    /// On failure the partially built descriptor is dropped by the caller;
    /// its already-materialized directories are still released through the
    /// drop backstop (unless preserved).
    pub fn generate(&self, request: &MakefileRequest<'_>) -> Result<Makefile> {
        let mut makefile = Makefile::new(request.preserve_build_artifacts);
        capture::write_preamble(&mut makefile.text);

        for artifact in request.artifacts {
            match artifact.classify() {
                DependencyClass::Direct => {
                    let unit = LibraryBuildUnit::direct(artifact, request.default_architecture);
                    self.emit_stanza(&mut makefile, unit, request.use_header_archives)?;
                }
                DependencyClass::Bundle => {
                    self.emit_bundle(&mut makefile, artifact, request)?;
                }
            }
        }

        tracing::debug!(fingerprint = %makefile.fingerprint(), "generated makefile");
        Ok(makefile)
    }

    /// Expand a bundle: unpack once, then emit one stanza per native binary
    /// found for each requested architecture, static binaries first.
    fn emit_bundle(
        &self,
        makefile: &mut Makefile,
        artifact: &NativeArtifact,
        request: &MakefileRequest<'_>,
    ) -> Result<()> {
        let unpacked = self.extractor.extract(artifact, &self.unpack_dir)?;

        for architecture in request.architectures {
            for linkage in [Linkage::Static, Linkage::Shared] {
                let binaries =
                    self.extractor
                        .list_native_binaries(&unpacked, architecture, linkage)?;
                for binary in binaries {
                    let unit =
                        LibraryBuildUnit::bundled(artifact, architecture, &binary, linkage);
                    self.emit_stanza(makefile, unit, request.use_header_archives)?;
                }
            }
        }

        Ok(())
    }

    /// Emit one conditional stanza and register its module name.
    fn emit_stanza(
        &self,
        makefile: &mut Makefile,
        unit: LibraryBuildUnit,
        use_header_archives: bool,
    ) -> Result<()> {
        let text = &mut makefile.text;

        text.push('\n');
        text.push_str(&format!(
            "ifeq ($(TARGET_ARCH_ABI),{})\n",
            unit.architecture
        ));
        text.push_str("#\n");
        text.push_str(&format!("# Group ID: {}\n", unit.group));
        text.push_str(&format!("# Artifact ID: {}\n", unit.name));
        text.push_str(&format!("# Artifact Type: {}\n", unit.kind_tag));
        text.push_str(&format!("# Version: {}\n", unit.version));
        text.push_str("include $(CLEAR_VARS)\n");
        text.push_str(&format!("LOCAL_MODULE    := {}\n", unit.module));

        let parent = unit
            .library_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let file_name = unit
            .library_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        text.push_str(&format!("LOCAL_PATH := {}\n", parent.display()));
        text.push_str(&format!("LOCAL_SRC_FILES := {}\n", file_name));
        text.push_str(&format!("LOCAL_MODULE_FILENAME := {}\n", unit.output_name));

        if use_header_archives {
            if let Some(ref har) = unit.header_archive {
                let materializer = HeaderMaterializer::new(self.store, self.build_dir);
                let include_dir = materializer.materialize(har)?;
                makefile
                    .text
                    .push_str(&format!("LOCAL_EXPORT_C_INCLUDES := {}\n", include_dir.display()));
                makefile.include_directories.push(include_dir);
            }
        }

        match unit.linkage {
            Linkage::Static => {
                makefile.static_modules.insert(unit.module.clone());
                makefile
                    .text
                    .push_str("include $(PREBUILT_STATIC_LIBRARY)\n");
            }
            Linkage::Shared => {
                makefile.shared_modules.insert(unit.module.clone());
                makefile
                    .text
                    .push_str("include $(PREBUILT_SHARED_LIBRARY)\n");
            }
        }

        makefile
            .text
            .push_str(&format!("endif #{}\n\n", unit.architecture));

        Ok(())
    }
}
