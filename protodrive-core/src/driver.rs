//! Job planning and sequential execution.
//!
//! The driver is handed an explicit configuration (roots and the source→
//! package mapping table) rather than reading any ambient state, so tests
//! can run several orchestrations against disjoint roots in one process.

use crate::dispatch::{run_job, Language};
use crate::error::DriveError;
use crate::ports::{BundleGenerator, SchemaCompiler};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::info;

/// One source-directory → destination-package mapping. The same mapping set
/// applies to every output language; only the destination root differs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Mapping {
    /// Schema source directory, relative to the proto root.
    pub source: Utf8PathBuf,
    /// Destination package namespace the bindings land under.
    pub namespace: String,
}

/// Explicit roots and mapping table for one orchestration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub proto_root: Utf8PathBuf,
    pub python_out: Utf8PathBuf,
    pub go_out: Utf8PathBuf,
    pub cpp_out: Utf8PathBuf,
    pub js_out: Utf8PathBuf,
    pub mappings: Vec<Mapping>,
}

impl DriveConfig {
    fn out_root(&self, language: Language) -> &Utf8Path {
        match language {
            Language::Python => &self.python_out,
            Language::Go => &self.go_out,
            Language::Cpp => &self.cpp_out,
            Language::Js => &self.js_out,
        }
    }
}

/// A fully specified unit of work. Jobs are independent; order only matters
/// for fail-fast reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source_dir: Utf8PathBuf,
    pub dest_base: Utf8PathBuf,
    pub namespace: String,
    pub language: Language,
}

/// Build the ordered job list: every mapping for the baseline language
/// first, then the analogous mappings per requested opt-in language, in
/// request order. Duplicate requests and the baseline itself are ignored.
pub fn plan_jobs(config: &DriveConfig, requested: &[Language]) -> Vec<Job> {
    let mut languages = vec![Language::Python];
    for lang in requested {
        if *lang != Language::Python && !languages.contains(lang) {
            languages.push(*lang);
        }
    }

    let mut jobs = Vec::with_capacity(languages.len() * config.mappings.len());
    for language in languages {
        for mapping in &config.mappings {
            jobs.push(Job {
                source_dir: config.proto_root.join(&mapping.source),
                dest_base: config.out_root(language).to_path_buf(),
                namespace: mapping.namespace.clone(),
                language,
            });
        }
    }
    jobs
}

/// Drives the whole regeneration: preflight, then each job in order, fail
/// fast on the first error.
pub struct Driver<'a> {
    config: DriveConfig,
    compiler: &'a dyn SchemaCompiler,
    bundler: &'a dyn BundleGenerator,
}

impl<'a> Driver<'a> {
    pub fn new(
        config: DriveConfig,
        compiler: &'a dyn SchemaCompiler,
        bundler: &'a dyn BundleGenerator,
    ) -> Self {
        Self {
            config,
            compiler,
            bundler,
        }
    }

    pub fn run(&self, requested: &[Language]) -> Result<(), DriveError> {
        self.compiler
            .check()
            .map_err(|e| DriveError::CompilerUnavailable {
                message: format!("{e:#}"),
            })?;

        let jobs = plan_jobs(&self.config, requested);
        info!(jobs = jobs.len(), "planned regeneration");
        for job in &jobs {
            run_job(job, self.compiler, self.bundler)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DriveConfig {
        DriveConfig {
            proto_root: Utf8PathBuf::from("/repo/proto"),
            python_out: Utf8PathBuf::from("/repo/python"),
            go_out: Utf8PathBuf::from("/repo/go"),
            cpp_out: Utf8PathBuf::from("/repo/cpp"),
            js_out: Utf8PathBuf::from("/repo/js"),
            mappings: vec![
                Mapping {
                    source: Utf8PathBuf::from("core"),
                    namespace: "core_pb".to_string(),
                },
                Mapping {
                    source: Utf8PathBuf::from("ext"),
                    namespace: "ext_pb".to_string(),
                },
            ],
        }
    }

    #[test]
    fn baseline_jobs_come_first_and_unconditionally() {
        let jobs = plan_jobs(&config(), &[]);
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.language == Language::Python));
        assert_eq!(jobs[0].source_dir, "/repo/proto/core");
        assert_eq!(jobs[0].dest_base, "/repo/python");
        assert_eq!(jobs[1].namespace, "ext_pb");
    }

    #[test]
    fn opt_in_languages_follow_in_request_order() {
        let jobs = plan_jobs(&config(), &[Language::Js, Language::Go]);
        let langs: Vec<Language> = jobs.iter().map(|j| j.language).collect();
        assert_eq!(
            langs,
            vec![
                Language::Python,
                Language::Python,
                Language::Js,
                Language::Js,
                Language::Go,
                Language::Go,
            ]
        );
        assert_eq!(jobs[2].dest_base, "/repo/js");
        assert_eq!(jobs[4].dest_base, "/repo/go");
    }

    #[test]
    fn duplicate_and_baseline_requests_are_ignored() {
        let jobs = plan_jobs(
            &config(),
            &[Language::Go, Language::Go, Language::Python],
        );
        assert_eq!(jobs.len(), 4);
        assert_eq!(
            jobs.iter().filter(|j| j.language == Language::Go).count(),
            2
        );
    }

    #[test]
    fn empty_mapping_table_plans_no_jobs() {
        let mut cfg = config();
        cfg.mappings.clear();
        assert!(plan_jobs(&cfg, &[Language::Go]).is_empty());
    }
}
