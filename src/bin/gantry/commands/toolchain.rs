//! `gantry toolchain` command.
//!
//! Resolves and prints the toolchain (and optionally the debug server) for
//! the configured architectures without running a build - the quickest way
//! to check an NDK installation against a project.

use anyhow::Result;

use gantry::core::architecture::parse_architectures;
use gantry::core::manifest::Manifest;
use gantry::ndk::AndroidNdk;

use crate::cli::ToolchainArgs;

pub fn execute(args: ToolchainArgs) -> Result<()> {
    let project_dir = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let manifest = Manifest::load_from_dir(&project_dir)?;

    let ndk = match args.ndk_path.or_else(|| manifest.ndk.path.clone()) {
        Some(path) => AndroidNdk::new(path)?,
        None => AndroidNdk::locate(None)?,
    };

    let architectures = match args.architecture {
        Some(architecture) => vec![architecture],
        None => manifest
            .ndk
            .architectures
            .as_deref()
            .map(parse_architectures)
            .unwrap_or_else(|| vec![manifest.ndk.default_architecture.clone()]),
    };

    println!("NDK root: {}", ndk.root().display());
    println!("ndk-build: {}", ndk.ndk_build_path().display());

    for architecture in &architectures {
        let toolchain = ndk.resolve_toolchain(architecture, Some(&manifest.ndk.toolchains))?;
        println!("{}: {}", architecture, toolchain);

        if args.debug_server {
            match ndk.debug_server(architecture) {
                Ok(path) => println!("{}: debug server {}", architecture, path.display()),
                Err(e) => println!("{}: {}", architecture, e),
            }
        }
    }

    Ok(())
}
