//! Configuration file loading for protodrive.
//!
//! Discovers and loads `protodrive.toml` from the repository root. The file
//! carries the roots and the source→namespace mapping table; CLI arguments
//! take precedence where both are given.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protodrive_core::{DriveConfig, Mapping};
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "protodrive.toml";

/// Top-level configuration from protodrive.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProtodriveConfig {
    /// Schema root and per-language output roots.
    pub paths: PathsConfig,

    /// Schema compiler invocation.
    pub compiler: CompilerConfig,

    /// Delegated bundle generator invocation.
    pub bundler: BundlerConfig,

    /// Source→namespace mapping table.
    #[serde(rename = "mapping")]
    pub mappings: Vec<Mapping>,
}

/// Paths section. Relative paths resolve against the repository root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub proto_root: Utf8PathBuf,
    pub python_out: Utf8PathBuf,
    pub go_out: Utf8PathBuf,
    pub cpp_out: Utf8PathBuf,
    pub js_out: Utf8PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            proto_root: Utf8PathBuf::from("proto"),
            python_out: Utf8PathBuf::from("python"),
            go_out: Utf8PathBuf::from("go"),
            cpp_out: Utf8PathBuf::from("cpp"),
            js_out: Utf8PathBuf::from("js"),
        }
    }
}

/// Compiler section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Program name or path of the schema compiler.
    pub program: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "protoc".to_string(),
        }
    }
}

/// Bundler section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Program name or path of the delegated generator.
    pub program: String,

    /// Arguments passed through verbatim.
    pub args: Vec<String>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            program: "pbjs".to_string(),
            args: Vec::new(),
        }
    }
}

impl ProtodriveConfig {
    /// Resolve the configured roots against `root` into an explicit driver
    /// configuration.
    pub fn to_drive_config(&self, root: &Utf8Path) -> DriveConfig {
        DriveConfig {
            proto_root: resolve(root, &self.paths.proto_root),
            python_out: resolve(root, &self.paths.python_out),
            go_out: resolve(root, &self.paths.go_out),
            cpp_out: resolve(root, &self.paths.cpp_out),
            js_out: resolve(root, &self.paths.js_out),
            mappings: self.mappings.clone(),
        }
    }
}

fn resolve(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Discover the protodrive.toml config file in the repository root.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a protodrive.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ProtodriveConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<ProtodriveConfig> {
    let config: ProtodriveConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the repository root, or return defaults if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<ProtodriveConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(ProtodriveConfig::default()),
    }
}

/// Parse a `--map SOURCE=NAMESPACE` flag.
pub fn parse_map_flag(flag: &str) -> anyhow::Result<Mapping> {
    let (source, namespace) = flag
        .split_once('=')
        .with_context(|| format!("--map expects SOURCE=NAMESPACE, got '{flag}'"))?;
    if source.is_empty() || namespace.is_empty() {
        anyhow::bail!("--map expects SOURCE=NAMESPACE, got '{flag}'");
    }
    Ok(Mapping {
        source: Utf8PathBuf::from(source),
        namespace: namespace.to_string(),
    })
}
