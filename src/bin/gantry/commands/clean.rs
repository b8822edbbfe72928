//! `gantry clean` command.

use anyhow::Result;

use gantry::core::manifest::Manifest;
use gantry::ops::{clean, CleanOptions};

use crate::cli::CleanArgs;

pub fn execute(args: CleanArgs) -> Result<()> {
    let project_dir = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let manifest = Manifest::load_from_dir(&project_dir)?;

    clean(
        &project_dir,
        &manifest,
        &CleanOptions {
            skip: false,
            clean_libraries: args.libraries,
            skip_objects: args.keep_objects,
        },
    )
}
