//! Native dependency artifacts.
//!
//! An artifact is one already-resolved entry of the dependency set: a
//! prebuilt static or shared library, a header archive, or a bundle package
//! (AAR / APKLIB) that carries native binaries among other content. The
//! build never resolves a dependency graph itself; artifacts arrive with
//! their backing files already fetched.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The artifact type tags understood by the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Prebuilt static library (`.a`).
    #[serde(rename = "a")]
    StaticLib,
    /// Prebuilt shared object (`.so`).
    #[serde(rename = "so")]
    SharedLib,
    /// Header archive: the exported C/C++ headers paired with a binary.
    #[serde(rename = "har")]
    HeaderArchive,
    /// Android library project package.
    Apklib,
    /// Android archive library.
    Aar,
}

impl ArtifactKind {
    /// The file extension used by this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::StaticLib => "a",
            ArtifactKind::SharedLib => "so",
            ArtifactKind::HeaderArchive => "har",
            ArtifactKind::Apklib => "apklib",
            ArtifactKind::Aar => "aar",
        }
    }

    /// Parse a type tag as it appears in a manifest or repository path.
    pub fn parse(tag: &str) -> Option<ArtifactKind> {
        match tag {
            "a" => Some(ArtifactKind::StaticLib),
            "so" => Some(ArtifactKind::SharedLib),
            "har" => Some(ArtifactKind::HeaderArchive),
            "apklib" => Some(ArtifactKind::Apklib),
            "aar" => Some(ArtifactKind::Aar),
            _ => None,
        }
    }

    /// Bundle kinds package native binaries inside a zip container and must
    /// be unpacked before their binaries are usable.
    pub fn is_bundle(&self) -> bool {
        matches!(self, ArtifactKind::Apklib | ArtifactKind::Aar)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Static vs shared linkage of one native binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Static,
    Shared,
}

impl Linkage {
    pub fn extension(&self) -> &'static str {
        match self {
            Linkage::Static => "a",
            Linkage::Shared => "so",
        }
    }
}

/// Coordinates naming an artifact in a repository, without a backing file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactSpec {
    pub group: String,
    pub name: String,
    pub version: String,
    pub kind: ArtifactKind,
    pub classifier: Option<String>,
}

impl fmt::Display for ArtifactSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)?;
        if let Some(ref classifier) = self.classifier {
            write!(f, ":{}", classifier)?;
        }
        write!(f, ":{}", self.kind)
    }
}

/// One resolved native dependency: coordinates plus the fetched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeArtifact {
    pub group: String,
    pub name: String,
    pub version: String,
    pub kind: ArtifactKind,
    pub classifier: Option<String>,
    /// The already-fetched backing file. Read-only to the build.
    pub file: PathBuf,
}

/// Partition of the dependency set used by the makefile generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyClass {
    /// A standalone prebuilt binary; contributes exactly one build unit.
    Direct,
    /// A package embedding native binaries; expanded per architecture.
    Bundle,
}

impl NativeArtifact {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        kind: ArtifactKind,
        classifier: Option<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        NativeArtifact {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            kind,
            classifier,
            file: file.into(),
        }
    }

    /// Classify for makefile generation.
    pub fn classify(&self) -> DependencyClass {
        if self.kind.is_bundle() {
            DependencyClass::Bundle
        } else {
            DependencyClass::Direct
        }
    }

    /// The architecture a direct artifact was built for: its classifier when
    /// present, else the build's default architecture.
    pub fn architecture(&self, default_architecture: &str) -> String {
        self.classifier
            .clone()
            .unwrap_or_else(|| default_architecture.to_string())
    }

    /// Linkage of a direct binary artifact. Bundles have no single linkage.
    pub fn linkage(&self) -> Option<Linkage> {
        match self.kind {
            ArtifactKind::StaticLib => Some(Linkage::Static),
            ArtifactKind::SharedLib => Some(Linkage::Shared),
            _ => None,
        }
    }

    /// The header-archive counterpart: same coordinates, `har` kind, and the
    /// supplied classifier (the unit's architecture-derived classifier for
    /// bundle binaries, the artifact's own classifier otherwise).
    pub fn header_archive(&self, classifier: Option<String>) -> ArtifactSpec {
        ArtifactSpec {
            group: self.group.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            kind: ArtifactKind::HeaderArchive,
            classifier,
        }
    }

    /// `group:name:version[:classifier]` display form.
    pub fn coordinates(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{}:{}:{}", self.group, self.name, self.version, c),
            None => format!("{}:{}:{}", self.group, self.name, self.version),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl fmt::Display for NativeArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.coordinates(), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(kind: ArtifactKind, classifier: Option<&str>) -> NativeArtifact {
        NativeArtifact::new(
            "com.example",
            "mylib",
            "1.0.0",
            kind,
            classifier.map(str::to_string),
            "/repo/mylib-1.0.0.a",
        )
    }

    #[test]
    fn test_bundle_kinds() {
        assert_eq!(
            artifact(ArtifactKind::Aar, None).classify(),
            DependencyClass::Bundle
        );
        assert_eq!(
            artifact(ArtifactKind::Apklib, None).classify(),
            DependencyClass::Bundle
        );
        assert_eq!(
            artifact(ArtifactKind::StaticLib, None).classify(),
            DependencyClass::Direct
        );
        assert_eq!(
            artifact(ArtifactKind::SharedLib, None).classify(),
            DependencyClass::Direct
        );
    }

    #[test]
    fn test_architecture_from_classifier_or_default() {
        assert_eq!(
            artifact(ArtifactKind::StaticLib, Some("x86")).architecture("armeabi"),
            "x86"
        );
        assert_eq!(
            artifact(ArtifactKind::StaticLib, None).architecture("armeabi"),
            "armeabi"
        );
    }

    #[test]
    fn test_header_archive_counterpart() {
        let har = artifact(ArtifactKind::StaticLib, Some("x86")).header_archive(Some("x86".into()));
        assert_eq!(har.kind, ArtifactKind::HeaderArchive);
        assert_eq!(har.group, "com.example");
        assert_eq!(har.classifier.as_deref(), Some("x86"));
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in [
            ArtifactKind::StaticLib,
            ArtifactKind::SharedLib,
            ArtifactKind::HeaderArchive,
            ArtifactKind::Apklib,
            ArtifactKind::Aar,
        ] {
            assert_eq!(ArtifactKind::parse(kind.extension()), Some(kind));
        }
        assert_eq!(ArtifactKind::parse("jar"), None);
    }
}
