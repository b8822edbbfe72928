//! Compiled-output collection.
//!
//! ndk-build drops shared libraries under `NDK_LIBS_OUT/<abi>` and static
//! libraries under `NDK_OUT/local/<abi>`. Nothing reports back which files
//! were produced, so collection is a naming-convention matcher over those
//! two directories: find `lib<name>*.<ext>` (or an exact overridden file
//! name), classify it, and record it as an attached build artifact.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::core::artifact::ArtifactKind;
use crate::core::manifest::{AdditionalModule, HeaderDirective, ProjectSection};
use crate::error::{Error, Result};

/// One artifact recorded against the build, tagged by architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedArtifact {
    pub file: PathBuf,
    pub kind: ArtifactKind,
    pub classifier: String,
}

/// Collects compiled binaries for one architecture pass.
pub struct OutputCollector<'a> {
    project: &'a ProjectSection,
    /// `NDK_LIBS_OUT`: shared libraries land here.
    libraries_dir: &'a Path,
    /// `NDK_OUT`: objects and static libraries land here.
    objects_dir: &'a Path,
    final_library_name: Option<&'a str>,
    allow_multi_artifacts: bool,
}

impl<'a> OutputCollector<'a> {
    pub fn new(
        project: &'a ProjectSection,
        libraries_dir: &'a Path,
        objects_dir: &'a Path,
        final_library_name: Option<&'a str>,
        allow_multi_artifacts: bool,
    ) -> Self {
        OutputCollector {
            project,
            libraries_dir,
            objects_dir,
            final_library_name,
            allow_multi_artifacts,
        }
    }

    fn library_dir(&self, architecture: &str) -> PathBuf {
        self.libraries_dir.join(architecture)
    }

    fn object_dir(&self, architecture: &str) -> PathBuf {
        self.objects_dir.join("local").join(architecture)
    }

    /// Collect the compiled libraries of one architecture.
    pub fn collect(&self, architecture: &str) -> Result<Vec<AttachedArtifact>> {
        let library_dir = self.library_dir(architecture);
        let object_dir = self.object_dir(architecture);

        let files = if let Some(final_name) = self.final_library_name {
            if self.allow_multi_artifacts {
                self.find_matching(&library_dir, &object_dir)?
            } else {
                vec![self.find_named(&library_dir, &object_dir, final_name)?]
            }
        } else if self.allow_multi_artifacts {
            self.find_matching(&library_dir, &object_dir)?
        } else {
            let matches = self.find_matching(&library_dir, &object_dir)?;
            if matches.len() != 1 {
                return Err(self.match_count_error(&matches, &library_dir, &object_dir));
            }
            matches
        };

        Ok(files
            .into_iter()
            .map(|file| {
                let kind = resolve_artifact_kind(self.project.packaging, &file);
                AttachedArtifact {
                    file,
                    kind,
                    classifier: self.classifier(architecture),
                }
            })
            .collect())
    }

    /// Collect the additionally built modules of one architecture, each
    /// looked up by exact name in both output locations.
    pub fn collect_additional(
        &self,
        architecture: &str,
        modules: &[AdditionalModule],
    ) -> Result<Vec<AttachedArtifact>> {
        let library_dir = self.library_dir(architecture);
        let object_dir = self.object_dir(architecture);

        modules
            .iter()
            .map(|module| {
                let file = self.find_named(&library_dir, &object_dir, &module.name)?;
                Ok(AttachedArtifact {
                    kind: resolve_artifact_kind(self.project.packaging, &file),
                    file,
                    classifier: format!("{}-{}", architecture, module.classifier),
                })
            })
            .collect()
    }

    /// Architecture classifier, extended by the project classifier when set.
    pub fn classifier(&self, architecture: &str) -> String {
        match &self.project.classifier {
            Some(extra) => format!("{}-{}", architecture, extra),
            None => architecture.to_string(),
        }
    }

    /// Prefix/suffix search: the shared-library location first, the object
    /// location only when it yielded nothing.
    fn find_matching(&self, library_dir: &Path, object_dir: &Path) -> Result<Vec<PathBuf>> {
        tracing::info!("searching {} for built libraries", library_dir.display());
        let mut files = self.matching_in(library_dir)?;
        if files.is_empty() {
            tracing::info!("searching {} for built libraries", object_dir.display());
            files = self.matching_in(object_dir)?;
        }
        files.sort();
        Ok(files)
    }

    fn matching_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let library_name = self.final_library_name.unwrap_or(&self.project.name);
        let extension = format!(".{}", self.project.packaging.extension());

        let Ok(entries) = fs::read_dir(dir) else {
            return Ok(Vec::new());
        };

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(&extension) {
                continue;
            }
            // Projects already named lib-something must not be required to
            // produce a double "liblib" prefix.
            let found = name.starts_with(&format!("lib{}", library_name))
                || (library_name.starts_with("lib") && name.starts_with(library_name));
            if found {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Exact-name lookup: `lib<name>.<ext>` in the shared-library location,
    /// then the object location, regardless of the declared packaging.
    // TODO: confirm with the product owner whether the cross-location
    // fallback should be narrowed when packaging is explicitly `so`.
    fn find_named(&self, library_dir: &Path, object_dir: &Path, name: &str) -> Result<PathBuf> {
        let file_name = format!("lib{}.{}", name, self.project.packaging.extension());

        let in_libs = library_dir.join(&file_name);
        if in_libs.is_file() {
            return Ok(in_libs);
        }
        let in_objs = object_dir.join(&file_name);
        if in_objs.is_file() {
            return Ok(in_objs);
        }

        Err(Error::build_output(format!(
            "could not locate final native library {} (tried {} and {})",
            file_name,
            in_libs.display(),
            in_objs.display()
        )))
    }

    fn match_count_error(
        &self,
        matches: &[PathBuf],
        library_dir: &Path,
        object_dir: &Path,
    ) -> Error {
        if matches.is_empty() {
            Error::build_output(format!(
                "no native compiled library found (none found in {} or {}); \
                 did the native compile complete successfully?",
                library_dir.display(),
                object_dir.display()
            ))
        } else {
            Error::build_output(format!(
                "only a single final native library is supported by the build, \
                 found {} in {}: {}",
                matches.len(),
                library_dir.display(),
                matches
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }
    }
}

/// Artifact kind for a collected file: the project packaging when it is a
/// native kind, else derived from the file extension.
fn resolve_artifact_kind(packaging: ArtifactKind, file: &Path) -> ArtifactKind {
    match packaging {
        ArtifactKind::SharedLib | ArtifactKind::StaticLib => packaging,
        _ => {
            if file.extension().and_then(|e| e.to_str()) == Some("so") {
                ArtifactKind::SharedLib
            } else {
                ArtifactKind::StaticLib
            }
        }
    }
}

/// Select the header files named by a directive: include globs relative to
/// its directory, minus the exclude patterns. Paths are returned with both
/// their absolute and directive-relative forms, sorted for determinism.
pub fn collect_header_files(directive: &HeaderDirective) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut excludes = Vec::with_capacity(directive.excludes.len());
    for pattern in &directive.excludes {
        excludes.push(Pattern::new(pattern).map_err(|e| {
            Error::configuration(format!("invalid header exclude pattern `{}`: {}", pattern, e))
        })?);
    }

    let mut files = Vec::new();
    for pattern in &directive.includes {
        let full_pattern = directive.directory.join(pattern);
        let matches = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
            Error::configuration(format!("invalid header include pattern `{}`: {}", pattern, e))
        })?;

        for path in matches.flatten() {
            if !path.is_file() {
                continue;
            }
            let relative = path
                .strip_prefix(&directive.directory)
                .unwrap_or(&path)
                .to_path_buf();
            if excludes.iter().any(|p| p.matches_path(&relative)) {
                continue;
            }
            files.push((path, relative));
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Pack header files into a `.har` archive under the build directory and
/// return one attachment per collected classifier.
pub fn create_header_archive(
    build_dir: &Path,
    directives: &[HeaderDirective],
    classifiers: &[String],
) -> Result<Vec<AttachedArtifact>> {
    use std::io::Write;

    let mut selected = Vec::new();
    for directive in directives {
        selected.extend(collect_header_files(directive)?);
    }

    fs::create_dir_all(build_dir)
        .map_err(|e| Error::io_path("create directory", build_dir, e))?;
    let archive = tempfile::Builder::new()
        .prefix("headers_")
        .suffix(".har")
        .tempfile_in(build_dir)
        .map_err(|e| Error::io_path("create header archive in", build_dir, e))?;

    {
        let mut zip = zip::ZipWriter::new(archive.as_file());
        for (path, relative) in &selected {
            let contents = fs::read(path).map_err(|e| Error::io_path("read header", path, e))?;
            zip.start_file(
                relative.to_string_lossy().replace('\\', "/"),
                zip::write::FileOptions::default(),
            )
            .map_err(|e| {
                Error::io(
                    format!("failed to add {} to header archive", relative.display()),
                    std::io::Error::new(std::io::ErrorKind::Other, e),
                )
            })?;
            zip.write_all(&contents)
                .map_err(|e| Error::io_path("write header entry", path, e))?;
        }
        zip.finish().map_err(|e| {
            Error::io(
                "failed to finish header archive".to_string(),
                std::io::Error::new(std::io::ErrorKind::Other, e),
            )
        })?;
    }

    let (_, archive_path) = archive
        .keep()
        .map_err(|e| Error::io("failed to persist header archive".to_string(), e.error))?;

    tracing::debug!(
        archive = %archive_path.display(),
        headers = selected.len(),
        "created header archive"
    );

    Ok(classifiers
        .iter()
        .map(|classifier| AttachedArtifact {
            file: archive_path.clone(),
            kind: ArtifactKind::HeaderArchive,
            classifier: classifier.clone(),
        })
        .collect())
}
