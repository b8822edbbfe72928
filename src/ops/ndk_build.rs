//! Implementation of `gantry build`.
//!
//! Drives one full ndk-build pass per target architecture, to completion,
//! in order: synthesize the makefile, hand it to the external build through
//! the environment, run ndk-build as a blocking subprocess, classify its
//! stderr, collect the compiled outputs, and release the temporary include
//! directories whether the pass succeeded or not.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde::Serialize;

use crate::core::architecture::{parse_architectures, NDK_ARCHITECTURES};
use crate::core::manifest::{HeaderDirective, Manifest};
use crate::error::Error;
use crate::extract::ZipBundleExtractor;
use crate::makefile::capture::{CapturedVariables, CAPTURE_FILE_ENV};
use crate::makefile::{Makefile, MakefileGenerator, MakefileRequest};
use crate::ndk::AndroidNdk;
use crate::ops::collect::{create_header_archive, AttachedArtifact, OutputCollector};
use crate::sources::LocalRepository;
use crate::util::config::GlobalConfig;
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Environment variable naming the generated makefile; the user's Android.mk
/// includes it via `$(GANTRY_MAKEFILE)`.
pub const MAKEFILE_ENV: &str = "GANTRY_MAKEFILE";

/// Environment variables carrying the linkage lists into the build.
pub const STATIC_LIBRARIES_ENV: &str = "GANTRY_LOCAL_STATIC_LIBRARIES";
pub const SHARED_LIBRARIES_ENV: &str = "GANTRY_LOCAL_SHARED_LIBRARIES";

/// File name the generated makefile is written to, per architecture.
pub const MAKEFILE_NAME: &str = "gantry_makefile.mk";

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// NDK root override (highest precedence).
    pub ndk_path: Option<PathBuf>,

    /// Space-separated architecture list override.
    pub architectures: Option<String>,

    /// Local artifact repository override.
    pub repository: Option<PathBuf>,

    /// Generate descriptors and print them as JSON without building.
    pub plan: bool,
}

/// Result of one architecture's build pass.
#[derive(Debug)]
pub struct BuildOutcome {
    pub architecture: String,
    pub attached: Vec<AttachedArtifact>,
}

/// Per-architecture descriptor summary emitted in plan mode.
#[derive(Debug, Serialize)]
pub struct DescriptorPlan {
    pub architecture: String,
    pub fingerprint: String,
    pub static_libraries: Vec<String>,
    pub shared_libraries: Vec<String>,
    pub stanzas: usize,
}

/// Decides whether ndk-build stderr output is a real error.
///
/// Not every non-zero exit is fatal: toolchains routinely exit unhappily
/// over text the user has declared a warning. With `ignore_warnings` set
/// nothing on stderr fails the build; otherwise a line fully matching the
/// warning pattern is not an error and anything else is.
#[derive(Debug, Clone)]
pub struct BuildErrorClassifier {
    ignore_warnings: bool,
    warning_pattern: Regex,
}

impl BuildErrorClassifier {
    pub fn new(ignore_warnings: bool, warning_pattern: &str) -> Result<Self> {
        // Anchored: the setting is documented as a full-text match.
        let anchored = format!("^(?:{})$", warning_pattern);
        let warning_pattern = Regex::new(&anchored)
            .with_context(|| format!("invalid build warnings pattern `{}`", warning_pattern))?;
        Ok(BuildErrorClassifier {
            ignore_warnings,
            warning_pattern,
        })
    }

    /// Classify one stderr line.
    pub fn is_error(&self, text: &str) -> bool {
        if self.ignore_warnings {
            return false;
        }
        !self.warning_pattern.is_match(text)
    }

    /// Whether captured stderr contains any line that is a real error.
    pub fn stderr_has_error(&self, stderr: &str) -> bool {
        stderr
            .lines()
            .filter(|line| !line.trim().is_empty())
            .any(|line| self.is_error(line))
    }
}

/// Run the native build for every configured architecture.
pub fn ndk_build(
    project_dir: &Path,
    manifest: &Manifest,
    options: &BuildOptions,
) -> Result<Vec<BuildOutcome>> {
    if manifest.ndk.skip {
        tracing::info!("skipping native build as per configuration");
        return Ok(Vec::new());
    }

    let global = GlobalConfig::load_global();
    let ndk = locate_ndk(project_dir, manifest, options, &global)?;
    let repository = locate_repository(project_dir, options, &global);
    let architectures = resolve_architectures(project_dir, manifest, options);
    if architectures.is_empty() {
        anyhow::bail!("no target architectures configured");
    }

    let artifacts = manifest.native_artifacts(project_dir, &repository)?;
    tracing::debug!(
        count = artifacts.len(),
        "resolved native library dependencies"
    );

    let classifier = BuildErrorClassifier::new(
        manifest.ndk.ignore_build_warnings,
        &manifest.ndk.build_warnings_pattern,
    )?;

    let build_dir = project_dir.join(&manifest.ndk.build_directory);
    ensure_dir(&build_dir)?;

    let mut outcomes = Vec::with_capacity(architectures.len());
    let mut plans = Vec::new();

    for architecture in &architectures {
        tracing::debug!(architecture = %architecture, "starting NDK build pass");

        let extractor = ZipBundleExtractor::new();
        let generator = MakefileGenerator::new(&repository, &extractor, &build_dir);
        let mut makefile = generator.generate(&MakefileRequest {
            artifacts: &artifacts,
            architectures: &architectures,
            default_architecture: &manifest.ndk.default_architecture,
            use_header_archives: manifest.ndk.use_header_archives,
            preserve_build_artifacts: manifest.ndk.preserve_build_artifacts,
        })?;

        if options.plan {
            plans.push(DescriptorPlan {
                architecture: architecture.clone(),
                fingerprint: makefile.fingerprint(),
                static_libraries: makefile
                    .static_library_list()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                shared_libraries: makefile
                    .shared_library_list()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                stanzas: makefile.text().matches("ifeq (").count(),
            });
            makefile.cleanup();
            continue;
        }

        // Cleanup must run on the failure path too.
        let result = build_architecture(
            project_dir,
            manifest,
            &ndk,
            &makefile,
            architecture,
            &build_dir,
            &classifier,
        );
        makefile.cleanup();
        let attached = result?;

        outcomes.push(BuildOutcome {
            architecture: architecture.clone(),
            attached,
        });
    }

    if options.plan {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    }

    Ok(outcomes)
}

/// One architecture's pass: write the makefile, invoke ndk-build, collect.
fn build_architecture(
    project_dir: &Path,
    manifest: &Manifest,
    ndk: &AndroidNdk,
    makefile: &Makefile,
    architecture: &str,
    build_dir: &Path,
    classifier: &BuildErrorClassifier,
) -> Result<Vec<AttachedArtifact>> {
    let arch_dir = build_dir.join(architecture);
    ensure_dir(&arch_dir)?;

    let makefile_path = arch_dir.join(MAKEFILE_NAME);
    crate::util::fs::write_string(&makefile_path, makefile.text())?;

    // Dropped (and thereby deleted) when the pass ends; it only needs to
    // outlive the readback below.
    let capture_file = tempfile::Builder::new()
        .prefix("gantry_makefile_captures")
        .suffix(".tmp")
        .tempfile_in(build_dir)
        .context("failed to create makefile capture file")?;

    let libraries_dir = project_dir.join(&manifest.ndk.libraries_directory);
    let objects_dir = project_dir.join(&manifest.ndk.objects_directory);

    let mut process = ProcessBuilder::new(ndk_build_executable(manifest, ndk))
        .env(MAKEFILE_ENV, makefile_path.to_string_lossy())
        .env(CAPTURE_FILE_ENV, capture_file.path().to_string_lossy());

    if makefile.has_static_libraries() {
        let list = makefile.static_library_list();
        tracing::debug!("{} = {}", STATIC_LIBRARIES_ENV, list);
        process = process.env(STATIC_LIBRARIES_ENV, list);
    }
    if makefile.has_shared_libraries() {
        let list = makefile.shared_library_list();
        tracing::debug!("{} = {}", SHARED_LIBRARIES_ENV, list);
        process = process.env(SHARED_LIBRARIES_ENV, list);
    }
    for (key, value) in &manifest.ndk.env {
        process = process.env(key, value);
    }

    let working_dir = manifest
        .ndk
        .working_directory
        .as_ref()
        .map(|dir| project_dir.join(dir))
        .unwrap_or_else(|| project_dir.to_path_buf());
    process = process.arg("-C").arg(&working_dir);

    if let Some(ref makefile_override) = manifest.ndk.makefile {
        let path = project_dir.join(makefile_override);
        if !path.exists() {
            return Err(Error::configuration(format!(
                "specified makefile {} does not exist",
                path.display()
            ))
            .into());
        }
        process = process.arg(format!("APP_BUILD_SCRIPT={}", makefile_override));
    }

    if let Some(ref application_makefile) = manifest.ndk.application_makefile {
        let path = project_dir.join(application_makefile);
        if !path.exists() {
            return Err(Error::configuration(format!(
                "specified application makefile {} does not exist",
                path.display()
            ))
            .into());
        }
        process = process.arg(format!("NDK_APPLICATION_MK={}", application_makefile));
    }

    if manifest.ndk.max_jobs {
        let jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        tracing::info!("executing {} parallel jobs", jobs);
        process = process.arg("-j").arg(jobs.to_string());
    }

    if let Some(ref toolchain) = manifest.ndk.ndk_toolchain {
        process = process.arg(format!("NDK_TOOLCHAIN={}", toolchain));
    } else {
        let toolchain = ndk.resolve_toolchain(architecture, Some(&manifest.ndk.toolchains))?;
        tracing::debug!(architecture, toolchain = %toolchain, "resolved toolchain");
        process = process
            .arg(format!("NDK_TOOLCHAIN={}", toolchain))
            .arg(format!("APP_ABI={}", architecture));
    }

    if let Some(ref additional) = manifest.ndk.additional_args {
        process = process.args(additional.split_whitespace());
    }

    process = process
        .arg(format!("NDK_LIBS_OUT={}", libraries_dir.display()))
        .arg(format!("NDK_OUT={}", objects_dir.display()))
        .arg(manifest.ndk.target.as_deref().unwrap_or("all"))
        .cwd(build_dir);

    tracing::debug!("{}", process.display_command());
    tracing::info!("executing NDK {} build at {}", architecture, build_dir.display());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("ndk-build {}", architecture));
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let start = Instant::now();
    let output = process.exec();
    spinner.finish_and_clear();
    let output = output?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        tracing::debug!("ndk-build stdout:\n{}", stdout);
    }

    if !output.status.success() {
        if classifier.stderr_has_error(&stderr) {
            return Err(Error::execution(format!(
                "`{}` failed with exit code {:?}\n{}",
                process.display_command(),
                output.status.code(),
                stderr
            ))
            .into());
        }
        tracing::warn!(
            "ndk-build exited non-zero but produced only ignorable warnings:\n{}",
            stderr
        );
    }

    eprintln!(
        "    Finished NDK {} build in {:.2}s",
        architecture,
        start.elapsed().as_secs_f64()
    );

    if !manifest.ndk.attach_libraries {
        tracing::info!("will skip attaching compiled libraries as per configuration");
        return Ok(Vec::new());
    }

    let collector = OutputCollector::new(
        &manifest.project,
        &libraries_dir,
        &objects_dir,
        manifest.ndk.final_library_name.as_deref(),
        manifest.ndk.allow_multi_artifacts,
    );

    let mut attached = collector.collect(architecture)?;
    attached.extend(collector.collect_additional(architecture, &manifest.modules)?);

    if manifest.ndk.attach_header_files {
        let classifiers: Vec<String> = attached.iter().map(|a| a.classifier.clone()).collect();
        let directives = header_directives(project_dir, manifest, capture_file.path())?;
        if !directives.is_empty() {
            attached.extend(create_header_archive(build_dir, &directives, &classifiers)?);
        }
    }

    for artifact in &attached {
        tracing::info!(
            "attached {} artifact {} ({})",
            artifact.kind,
            artifact.file.display(),
            artifact.classifier
        );
    }

    Ok(attached)
}

/// Header directives for the exported header archive, in precedence order:
/// captured `LOCAL_C_INCLUDES`, the manifest's `[[headers]]`, the default
/// `jni/` tree.
fn header_directives(
    project_dir: &Path,
    manifest: &Manifest,
    capture_path: &Path,
) -> Result<Vec<HeaderDirective>> {
    if manifest.ndk.use_local_src_include_paths {
        let captured = CapturedVariables::read(capture_path)?;
        let directives: Vec<HeaderDirective> = captured
            .local_c_includes()
            .into_iter()
            .map(|include| HeaderDirective {
                directory: project_dir.join(include),
                includes: vec!["**/*.h".to_string()],
                excludes: Vec::new(),
            })
            .collect();
        if !directives.is_empty() {
            return Ok(directives);
        }
    } else if !manifest.headers.is_empty() {
        return Ok(manifest
            .headers
            .iter()
            .map(|directive| HeaderDirective {
                directory: project_dir.join(&directive.directory),
                includes: directive.includes.clone(),
                excludes: directive.excludes.clone(),
            })
            .collect());
    }

    tracing::debug!("no header files configured, using the default jni/ set");
    let jni = project_dir.join("jni");
    if jni.is_dir() {
        Ok(vec![HeaderDirective {
            directory: jni,
            includes: vec!["**/*.h".to_string()],
            excludes: Vec::new(),
        }])
    } else {
        Ok(Vec::new())
    }
}

fn ndk_build_executable(manifest: &Manifest, ndk: &AndroidNdk) -> PathBuf {
    if let Some(ref executable) = manifest.ndk.ndk_build_executable {
        tracing::debug!("ndk-build overridden, using {}", executable);
        if let Ok(found) = which::which(executable) {
            return found;
        }
        return PathBuf::from(executable);
    }
    ndk.ndk_build_path()
}

/// NDK location precedence: CLI flag, manifest, global config, environment.
fn locate_ndk(
    project_dir: &Path,
    manifest: &Manifest,
    options: &BuildOptions,
    global: &GlobalConfig,
) -> crate::error::Result<AndroidNdk> {
    if let Some(ref path) = options.ndk_path {
        return AndroidNdk::new(path);
    }
    if let Some(ref path) = manifest.ndk.path {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            project_dir.join(path)
        };
        return AndroidNdk::new(path);
    }
    if let Some(ref path) = global.ndk.path {
        return AndroidNdk::new(path);
    }
    AndroidNdk::locate(None)
}

fn locate_repository(
    project_dir: &Path,
    options: &BuildOptions,
    global: &GlobalConfig,
) -> LocalRepository {
    if let Some(ref root) = options.repository {
        return LocalRepository::new(root);
    }
    if let Some(ref root) = global.ndk.repository {
        return LocalRepository::new(root);
    }
    LocalRepository::default_location()
        .unwrap_or_else(|| LocalRepository::new(project_dir.join(".gantry/repository")))
}

/// Architecture list precedence: CLI flag, manifest, the application
/// makefile's `APP_ABI`, the default architecture.
fn resolve_architectures(
    project_dir: &Path,
    manifest: &Manifest,
    options: &BuildOptions,
) -> Vec<String> {
    if let Some(ref list) = options.architectures {
        return parse_architectures(list);
    }
    if let Some(ref list) = manifest.ndk.architectures {
        return parse_architectures(list);
    }

    let application_mk = project_dir.join(
        manifest
            .ndk
            .application_makefile
            .as_deref()
            .unwrap_or("jni/Application.mk"),
    );
    if let Some(abis) = read_app_abi(&application_mk) {
        return abis;
    }

    vec![manifest.ndk.default_architecture.clone()]
}

/// Read `APP_ABI` from an Application.mk, expanding `all`.
fn read_app_abi(application_mk: &Path) -> Option<Vec<String>> {
    let contents = std::fs::read_to_string(application_mk).ok()?;
    for line in contents.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("APP_ABI") else {
            continue;
        };
        let Some((_, value)) = rest.split_once(":=").or_else(|| rest.split_once('=')) else {
            continue;
        };
        let abis = parse_architectures(value);
        if abis.iter().any(|a| a == "all") {
            return Some(NDK_ARCHITECTURES.iter().map(|s| s.to_string()).collect());
        }
        if !abis.is_empty() {
            return Some(abis);
        }
    }
    None
}
