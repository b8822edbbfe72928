//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Gantry - a dependency-graph-driven native build driver for the Android NDK
#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the NDK build for every configured architecture
    Build(BuildArgs),

    /// Remove native build outputs
    Clean(CleanArgs),

    /// Show resolved toolchains and debug servers
    Toolchain(ToolchainArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Android NDK installation root
    #[arg(long, env = "ANDROID_NDK_HOME")]
    pub ndk_path: Option<PathBuf>,

    /// Space-separated architectures to build (overrides the manifest)
    #[arg(long)]
    pub architectures: Option<String>,

    /// Local artifact repository root
    #[arg(long)]
    pub repository: Option<PathBuf>,

    /// Emit the per-architecture build descriptors as JSON without building
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Also delete the libraries output directory
    #[arg(long)]
    pub libraries: bool,

    /// Keep the objects output directory
    #[arg(long)]
    pub keep_objects: bool,
}

#[derive(Args)]
pub struct ToolchainArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Android NDK installation root
    #[arg(long, env = "ANDROID_NDK_HOME")]
    pub ndk_path: Option<PathBuf>,

    /// Architecture to resolve (defaults to every configured architecture)
    #[arg(long)]
    pub architecture: Option<String>,

    /// Also locate the debug server binary
    #[arg(long)]
    pub debug_server: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
