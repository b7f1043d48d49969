//! Port traits abstracting the external code generators away from dispatch.

use crate::error::DriveError;
use camino::{Utf8Path, Utf8PathBuf};

/// One invocation of the schema compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Include search paths (`-I`), staging tree roots.
    pub includes: Vec<Utf8PathBuf>,
    /// Output-language flag without dashes, e.g. `python_out`.
    pub out_flag: String,
    /// Directory the compiler writes generated bindings into.
    pub out_dir: Utf8PathBuf,
    /// Input schema files, absolute staged paths.
    pub inputs: Vec<Utf8PathBuf>,
}

/// The external schema compiler. Failure is signalled via `Err`; the
/// orchestrator never inspects generated output.
pub trait SchemaCompiler {
    fn compile(&self, req: &CompileRequest) -> anyhow::Result<()>;

    /// Cheap availability probe, run once before any job.
    fn check(&self) -> anyhow::Result<()>;
}

/// The delegated generator for the one output language the compiler does not
/// cover. Runs as a child process with a fixed working directory; the
/// returned bytes are its captured standard output.
pub trait BundleGenerator {
    fn generate(&self, working_dir: &Utf8Path) -> Result<Vec<u8>, DriveError>;
}
