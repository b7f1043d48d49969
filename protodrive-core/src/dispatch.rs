//! Per-language packaging strategies.
//!
//! Each output language wants its staging tree shaped differently and its
//! compiler invoked differently; everything else (staging, rewriting,
//! cleanup) is shared. The set is closed: adding a language means adding a
//! variant here, and an unsupported language cannot be represented at all.

use crate::driver::Job;
use crate::error::DriveError;
use crate::ports::{BundleGenerator, CompileRequest, SchemaCompiler};
use crate::rewrite::ImportLayout;
use crate::staging::StagingTree;
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use tracing::{debug, info};

/// Package-marker file required by the baseline language's package system.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Fixed artifact name the delegated generator's output is captured into.
pub const BUNDLE_FILE: &str = "proto_bundle.js";

/// Supported output languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Baseline: flat package, generated unconditionally on every run.
    Python,
    /// One package per schema file.
    Go,
    /// Library target: output nested under the namespace directory.
    Cpp,
    /// Delegated to an external bundler.
    Js,
}

impl Language {
    pub fn token(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Go => "go",
            Language::Cpp => "cpp",
            Language::Js => "js",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Execute one job: shape and stage the sources, ensure the destination
/// package exists, and drive the external generator. The staging tree is
/// gone by the time this returns, success or not.
pub fn run_job(
    job: &Job,
    compiler: &dyn SchemaCompiler,
    bundler: &dyn BundleGenerator,
) -> Result<(), DriveError> {
    info!(language = %job.language, source = %job.source_dir, namespace = %job.namespace, "running job");
    match job.language {
        Language::Python => compile_flat_package(job, compiler),
        Language::Go => compile_per_file_packages(job, compiler),
        Language::Cpp => compile_library_dir(job, compiler),
        Language::Js => write_delegated_bundle(job, bundler),
    }
}

/// Baseline strategy: everything in one package directory, one compiler
/// call over all staged files.
fn compile_flat_package(job: &Job, compiler: &dyn SchemaCompiler) -> Result<(), DriveError> {
    let package_dir = job.dest_base.join(&job.namespace);
    ensure_marked_package(&package_dir)?;

    let tree = StagingTree::stage(&job.source_dir, &job.namespace, ImportLayout::Flat)?;
    compiler
        .compile(&CompileRequest {
            includes: vec![tree.include_root().to_path_buf()],
            out_flag: "python_out".to_string(),
            out_dir: job.dest_base.clone(),
            inputs: tree.files().to_vec(),
        })
        .context("compile flat package")?;
    Ok(())
}

/// One sub-package per schema file, one independent compiler call per file.
/// Go treats every directory as a package, so package boundaries can only
/// line up if each file compiles into its own directory.
fn compile_per_file_packages(job: &Job, compiler: &dyn SchemaCompiler) -> Result<(), DriveError> {
    let package_dir = job.dest_base.join(&job.namespace);
    fs::create_dir_all(&package_dir)
        .with_context(|| format!("create {}", package_dir))?;

    let tree = StagingTree::stage(&job.source_dir, &job.namespace, ImportLayout::PerFilePackage)?;
    for input in tree.files() {
        compiler
            .compile(&CompileRequest {
                includes: vec![tree.include_root().to_path_buf()],
                out_flag: "go_out".to_string(),
                out_dir: job.dest_base.clone(),
                inputs: vec![input.clone()],
            })
            .with_context(|| format!("compile {}", input))?;
    }
    Ok(())
}

/// Library strategy: flat staging, single call, output directed at the
/// namespace directory itself.
fn compile_library_dir(job: &Job, compiler: &dyn SchemaCompiler) -> Result<(), DriveError> {
    let out_dir = job.dest_base.join(&job.namespace);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create {}", out_dir))?;

    let tree = StagingTree::stage(&job.source_dir, &job.namespace, ImportLayout::Flat)?;
    compiler
        .compile(&CompileRequest {
            includes: vec![tree.include_root().to_path_buf()],
            out_flag: "cpp_out".to_string(),
            out_dir,
            inputs: tree.files().to_vec(),
        })
        .context("compile library dir")?;
    Ok(())
}

/// Delegated strategy: no staging at all. Run the external bundler with the
/// source dir as its working directory and capture stdout verbatim.
fn write_delegated_bundle(job: &Job, bundler: &dyn BundleGenerator) -> Result<(), DriveError> {
    let package_dir = job.dest_base.join(&job.namespace);
    fs::create_dir_all(&package_dir)
        .with_context(|| format!("create {}", package_dir))?;

    let bundle = bundler.generate(&job.source_dir)?;
    let artifact = package_dir.join(BUNDLE_FILE);
    fs::write(&artifact, &bundle).with_context(|| format!("write {}", artifact))?;
    debug!(artifact = %artifact, bytes = bundle.len(), "wrote delegated bundle");
    Ok(())
}

/// Create the package directory and its marker file. A marker that already
/// exists is left untouched, so two jobs feeding the same package are safe.
fn ensure_marked_package(package_dir: &Utf8Path) -> Result<(), DriveError> {
    fs::create_dir_all(package_dir)
        .with_context(|| format!("create {}", package_dir))?;
    let marker = package_dir.join(PACKAGE_MARKER);
    if !marker.exists() {
        fs::write(&marker, "").with_context(|| format!("write {}", marker))?;
    }
    Ok(())
}
