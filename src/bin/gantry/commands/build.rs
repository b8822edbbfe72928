//! `gantry build` command.

use anyhow::Result;

use gantry::core::manifest::Manifest;
use gantry::ops::{ndk_build, BuildOptions};

use crate::cli::BuildArgs;

pub fn execute(args: BuildArgs) -> Result<()> {
    let project_dir = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let manifest = Manifest::load_from_dir(&project_dir)?;

    let options = BuildOptions {
        ndk_path: args.ndk_path,
        architectures: args.architectures,
        repository: args.repository,
        plan: args.plan,
    };

    let outcomes = ndk_build(&project_dir, &manifest, &options)?;

    for outcome in &outcomes {
        for artifact in &outcome.attached {
            println!(
                "{}\t{}\t{}",
                artifact.classifier,
                artifact.kind,
                artifact.file.display()
            );
        }
    }

    Ok(())
}
