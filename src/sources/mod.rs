//! Artifact lookup.
//!
//! Dependency-graph resolution and fetching happen upstream; by the time the
//! build runs, every artifact either carries an explicit file path or can be
//! found in a local repository laid out by the host build tool. The
//! [`ArtifactStore`] trait is the seam: the makefile generator asks it for
//! header-archive counterparts, and the manifest loader asks it for
//! dependency entries without an explicit `file`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::artifact::ArtifactSpec;
use crate::error::{Error, Result};

/// Resolves artifact coordinates to an already-fetched local file.
pub trait ArtifactStore {
    /// Return the backing file for `spec`, or a resolution error naming the
    /// coordinates and where they were looked for.
    fn resolve(&self, spec: &ArtifactSpec) -> Result<PathBuf>;
}

/// A repository directory using the conventional
/// `group/as/dirs/name/version/name-version[-classifier].ext` layout.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalRepository { root: root.into() }
    }

    /// The default repository under the user's home directory.
    pub fn default_location() -> Option<Self> {
        directories::BaseDirs::new()
            .map(|dirs| LocalRepository::new(dirs.home_dir().join(".m2").join("repository")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository-relative path for a set of coordinates.
    pub fn artifact_path(&self, spec: &ArtifactSpec) -> PathBuf {
        let mut file_name = format!("{}-{}", spec.name, spec.version);
        if let Some(ref classifier) = spec.classifier {
            file_name.push('-');
            file_name.push_str(classifier);
        }
        file_name.push('.');
        file_name.push_str(spec.kind.extension());

        let mut path = self.root.clone();
        for segment in spec.group.split('.') {
            path.push(segment);
        }
        path.push(&spec.name);
        path.push(&spec.version);
        path.push(file_name);
        path
    }
}

impl ArtifactStore for LocalRepository {
    fn resolve(&self, spec: &ArtifactSpec) -> Result<PathBuf> {
        let path = self.artifact_path(spec);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::resolution(format!(
                "artifact {} not found in local repository (looked for {})",
                spec,
                path.display()
            )))
        }
    }
}

/// Fixed coordinate -> file map, for wiring tests and embedders that manage
/// artifact files themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticStore {
    entries: HashMap<ArtifactSpec, PathBuf>,
}

impl StaticStore {
    pub fn new() -> Self {
        StaticStore::default()
    }

    pub fn insert(&mut self, spec: ArtifactSpec, file: impl Into<PathBuf>) {
        self.entries.insert(spec, file.into());
    }
}

impl ArtifactStore for StaticStore {
    fn resolve(&self, spec: &ArtifactSpec) -> Result<PathBuf> {
        self.entries.get(spec).cloned().ok_or_else(|| {
            Error::resolution(format!("artifact {} not present in the build's store", spec))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::ArtifactKind;
    use std::fs;
    use tempfile::TempDir;

    fn spec(classifier: Option<&str>) -> ArtifactSpec {
        ArtifactSpec {
            group: "com.example.native".to_string(),
            name: "mylib".to_string(),
            version: "1.2.0".to_string(),
            kind: ArtifactKind::HeaderArchive,
            classifier: classifier.map(str::to_string),
        }
    }

    #[test]
    fn test_repository_layout() {
        let repo = LocalRepository::new("/repo");
        assert_eq!(
            repo.artifact_path(&spec(None)),
            PathBuf::from("/repo/com/example/native/mylib/1.2.0/mylib-1.2.0.har")
        );
        assert_eq!(
            repo.artifact_path(&spec(Some("x86"))),
            PathBuf::from("/repo/com/example/native/mylib/1.2.0/mylib-1.2.0-x86.har")
        );
    }

    #[test]
    fn test_resolve_existing_and_missing() {
        let tmp = TempDir::new().unwrap();
        let repo = LocalRepository::new(tmp.path());

        let target = repo.artifact_path(&spec(None));
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"headers").unwrap();

        assert_eq!(repo.resolve(&spec(None)).unwrap(), target);

        let err = repo.resolve(&spec(Some("x86"))).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
        assert!(err.to_string().contains("mylib-1.2.0-x86.har"));
    }

    #[test]
    fn test_static_store() {
        let mut store = StaticStore::new();
        store.insert(spec(None), "/tmp/mylib.har");

        assert_eq!(
            store.resolve(&spec(None)).unwrap(),
            PathBuf::from("/tmp/mylib.har")
        );
        assert!(store.resolve(&spec(Some("x86"))).is_err());
    }
}
