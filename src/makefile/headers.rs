//! Header archive materialization.
//!
//! A binary dependency's exported headers travel as a separate `har`
//! artifact. To make them compiler-visible the archive is unpacked into a
//! throwaway directory under the build directory and wired into the makefile
//! as a `LOCAL_EXPORT_C_INCLUDES` path. Directory names must never collide
//! across repeated or per-architecture materializations within one session,
//! so each combines a millisecond timestamp, a process-wide counter, and the
//! artifact name.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::artifact::ArtifactSpec;
use crate::error::{Error, Result};
use crate::extract::unzip;
use crate::sources::ArtifactStore;

static MATERIALIZE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unpacks header archives into unique include directories.
pub struct HeaderMaterializer<'a> {
    store: &'a dyn ArtifactStore,
    build_dir: &'a Path,
}

impl<'a> HeaderMaterializer<'a> {
    pub fn new(store: &'a dyn ArtifactStore, build_dir: &'a Path) -> Self {
        HeaderMaterializer { store, build_dir }
    }

    /// Resolve and unpack the header archive named by `spec`, returning the
    /// freshly created include directory. The caller owns the directory and
    /// is responsible for registering it for cleanup.
    pub fn materialize(&self, spec: &ArtifactSpec) -> Result<PathBuf> {
        let archive = self.store.resolve(spec).map_err(|e| {
            Error::resolution(format!(
                "failed to resolve header archive for {}: {}",
                spec.name, e
            ))
        })?;
        tracing::debug!(artifact = %spec, file = %archive.display(), "resolved header archive");

        let include_dir = self.build_dir.join(unique_dir_name(&spec.name));
        unzip(&archive, &include_dir)?;

        Ok(include_dir)
    }
}

fn unique_dir_name(artifact_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = MATERIALIZE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("native_includes_{}_{}_{}", millis, seq, artifact_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::ArtifactKind;
    use crate::sources::StaticStore;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn har_spec(classifier: Option<&str>) -> ArtifactSpec {
        ArtifactSpec {
            group: "com.example".to_string(),
            name: "mylib".to_string(),
            version: "1.0".to_string(),
            kind: ArtifactKind::HeaderArchive,
            classifier: classifier.map(str::to_string),
        }
    }

    fn write_har(path: &Path) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("include/mylib.h", FileOptions::default())
            .unwrap();
        zip.write_all(b"#pragma once\n").unwrap();
        zip.start_file("META-INF/MANIFEST.MF", FileOptions::default())
            .unwrap();
        zip.write_all(b"Manifest-Version: 1.0\n").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_materialize_unpacks_headers_without_metadata() {
        let tmp = TempDir::new().unwrap();
        let har = tmp.path().join("mylib-1.0.har");
        write_har(&har);

        let mut store = StaticStore::new();
        store.insert(har_spec(None), &har);

        let materializer = HeaderMaterializer::new(&store, tmp.path());
        let dir = materializer.materialize(&har_spec(None)).unwrap();

        assert!(dir.join("include/mylib.h").is_file());
        assert!(!dir.join("META-INF").exists());
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("mylib"));
    }

    #[test]
    fn test_repeated_materialization_yields_distinct_directories() {
        let tmp = TempDir::new().unwrap();
        let har = tmp.path().join("mylib-1.0.har");
        write_har(&har);

        let mut store = StaticStore::new();
        store.insert(har_spec(None), &har);

        let materializer = HeaderMaterializer::new(&store, tmp.path());
        let first = materializer.materialize(&har_spec(None)).unwrap();
        let second = materializer.materialize(&har_spec(None)).unwrap();

        assert_ne!(first, second);
        assert!(first.is_dir());
        assert!(second.is_dir());
    }

    #[test]
    fn test_unresolvable_archive_is_resolution_error() {
        let tmp = TempDir::new().unwrap();
        let store = StaticStore::new();
        let materializer = HeaderMaterializer::new(&store, tmp.path());

        let err = materializer.materialize(&har_spec(Some("x86"))).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
        assert!(err.to_string().contains("mylib"));
    }
}
