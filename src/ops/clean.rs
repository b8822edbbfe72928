//! Implementation of `gantry clean`.

use std::path::Path;

use anyhow::Result;

use crate::core::manifest::Manifest;
use crate::util::fs::remove_dir_all_if_exists;

/// Options for the clean command.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Skip the clean entirely.
    pub skip: bool,

    /// Also delete the libraries output directory. Off by default to avoid
    /// deleting prebuilt libraries a project keeps in that tree.
    pub clean_libraries: bool,

    /// Keep the objects output directory.
    pub skip_objects: bool,
}

/// Remove the build directory and the native output directories.
pub fn clean(project_dir: &Path, manifest: &Manifest, options: &CleanOptions) -> Result<()> {
    if options.skip {
        tracing::info!("skipping clean as per configuration");
        return Ok(());
    }

    let build_dir = project_dir.join(&manifest.ndk.build_directory);
    tracing::info!("removing {}", build_dir.display());
    remove_dir_all_if_exists(&build_dir)?;

    if options.skip_objects {
        tracing::debug!("keeping objects output directory");
    } else {
        let objects_dir = project_dir.join(&manifest.ndk.objects_directory);
        tracing::info!("removing {}", objects_dir.display());
        remove_dir_all_if_exists(&objects_dir)?;
    }

    if options.clean_libraries {
        let libraries_dir = project_dir.join(&manifest.ndk.libraries_directory);
        tracing::info!("removing {}", libraries_dir.display());
        remove_dir_all_if_exists(&libraries_dir)?;
    } else {
        tracing::debug!("keeping libraries output directory");
    }

    Ok(())
}
