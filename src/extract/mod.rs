//! Bundle package extraction.
//!
//! AAR and APKLIB dependencies are zip containers carrying native binaries
//! under `jni/<abi>/` (AAR) or `libs/<abi>/` (APKLIB) next to unrelated
//! packaged content. Before their binaries can appear in a makefile the
//! bundle must be unpacked to disk; [`BundleExtractor`] is the seam the
//! makefile generator works against, [`ZipBundleExtractor`] the shipped
//! implementation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::ZipArchive;

use crate::core::artifact::{Linkage, NativeArtifact};
use crate::error::{Error, Result};

/// Unpacks bundle packages and lists the native binaries inside them.
pub trait BundleExtractor {
    /// Unpack `artifact` below `dest`, returning the directory holding its
    /// contents. Repeated calls for the same artifact within one session
    /// return the already-unpacked tree.
    fn extract(&self, artifact: &NativeArtifact, dest: &Path) -> Result<PathBuf>;

    /// List the native binaries of one linkage kind for one architecture
    /// inside an unpacked tree, sorted by path.
    fn list_native_binaries(
        &self,
        unpacked: &Path,
        architecture: &str,
        linkage: Linkage,
    ) -> Result<Vec<PathBuf>>;
}

/// Zip-based extractor for AAR and APKLIB bundles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipBundleExtractor;

impl ZipBundleExtractor {
    pub fn new() -> Self {
        ZipBundleExtractor
    }

    /// Directory one artifact unpacks into: unique per coordinates so two
    /// versions of the same library never overwrite each other.
    fn unpack_dir(artifact: &NativeArtifact, dest: &Path) -> PathBuf {
        let mut dir_name = format!("{}-{}-{}", artifact.group, artifact.name, artifact.version);
        if let Some(ref classifier) = artifact.classifier {
            dir_name.push('-');
            dir_name.push_str(classifier);
        }
        dest.join(dir_name)
    }
}

/// Unpack a zip archive below `dest`, skipping `META-INF/` packaging
/// metadata and any entry that would escape the destination.
pub fn unzip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)
        .map_err(|e| Error::io_path("open archive", archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        Error::io(
            format!("{} is not a readable zip archive", archive_path.display()),
            io::Error::new(io::ErrorKind::InvalidData, e),
        )
    })?;

    fs::create_dir_all(dest).map_err(|e| Error::io_path("create directory", dest, e))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            Error::io(
                format!("failed to read entry {} of {}", index, archive_path.display()),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;

        // enclosed_name rejects entries that would escape the target.
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!(
                "skipping zip entry escaping the destination: {}",
                entry.name()
            );
            continue;
        };

        // Packaging metadata is not content.
        if relative.starts_with("META-INF") {
            continue;
        }

        let out_path = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| Error::io_path("create directory", &out_path, e))?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::io_path("create directory", parent, e))?;
            }
            let mut out = fs::File::create(&out_path)
                .map_err(|e| Error::io_path("create file", &out_path, e))?;
            io::copy(&mut entry, &mut out)
                .map_err(|e| Error::io_path("extract file", &out_path, e))?;
        }
    }

    Ok(())
}

impl BundleExtractor for ZipBundleExtractor {
    fn extract(&self, artifact: &NativeArtifact, dest: &Path) -> Result<PathBuf> {
        let target = Self::unpack_dir(artifact, dest);
        if target.is_dir() {
            tracing::debug!(artifact = %artifact, "bundle already unpacked");
            return Ok(target);
        }

        tracing::debug!(artifact = %artifact, dest = %target.display(), "unpacking bundle");
        unzip(artifact.file(), &target)?;
        Ok(target)
    }

    fn list_native_binaries(
        &self,
        unpacked: &Path,
        architecture: &str,
        linkage: Linkage,
    ) -> Result<Vec<PathBuf>> {
        let extension = linkage.extension();
        let mut binaries = Vec::new();

        // AARs keep native code under jni/<abi>, APKLIBs under libs/<abi>.
        for subtree in ["jni", "libs"] {
            let abi_dir = unpacked.join(subtree).join(architecture);
            if !abi_dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&abi_dir).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(extension)
                {
                    binaries.push(path.to_path_buf());
                }
            }
        }

        binaries.sort();
        Ok(binaries)
    }
}
