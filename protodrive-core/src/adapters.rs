//! Default process-backed port implementations, plus recording variants for
//! embedding and testing.

use crate::error::DriveError;
use crate::ports::{BundleGenerator, CompileRequest, SchemaCompiler};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Command as ProcessCommand;
use std::sync::Mutex;
use tracing::debug;

/// Shells out to `protoc` (or a drop-in replacement).
#[derive(Debug, Clone)]
pub struct ProtocCompiler {
    program: String,
}

impl ProtocCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SchemaCompiler for ProtocCompiler {
    fn compile(&self, req: &CompileRequest) -> anyhow::Result<()> {
        let mut cmd = ProcessCommand::new(&self.program);
        for include in &req.includes {
            cmd.arg(format!("-I{include}"));
        }
        cmd.arg(format!("--{}={}", req.out_flag, req.out_dir));
        for input in &req.inputs {
            cmd.arg(input.as_str());
        }

        debug!(program = %self.program, out_flag = %req.out_flag, inputs = req.inputs.len(), "invoking schema compiler");
        let status = cmd
            .status()
            .with_context(|| format!("invoke {}", self.program))?;
        if !status.success() {
            anyhow::bail!("{} exited with {status}", self.program);
        }
        Ok(())
    }

    fn check(&self) -> anyhow::Result<()> {
        let output = ProcessCommand::new(&self.program)
            .arg("--version")
            .output()
            .with_context(|| format!("run {} --version", self.program))?;
        if !output.status.success() {
            anyhow::bail!("{} --version exited with {}", self.program, output.status);
        }
        Ok(())
    }
}

/// Runs the configured external generator and captures its stdout.
#[derive(Debug, Clone)]
pub struct ShellBundleGenerator {
    program: String,
    args: Vec<String>,
}

impl ShellBundleGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl BundleGenerator for ShellBundleGenerator {
    fn generate(&self, working_dir: &Utf8Path) -> Result<Vec<u8>, DriveError> {
        debug!(program = %self.program, cwd = %working_dir, "invoking bundle generator");
        let output = ProcessCommand::new(&self.program)
            .args(&self.args)
            .current_dir(working_dir)
            .output()
            .with_context(|| format!("invoke {}", self.program))
            .map_err(DriveError::Fatal)?;
        if !output.status.success() {
            return Err(DriveError::GeneratorFailed {
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(output.stdout)
    }
}

/// Records every request instead of invoking a process. For embedding and
/// testing; can be told to fail after a number of successful calls.
#[derive(Debug, Default)]
pub struct RecordingCompiler {
    requests: Mutex<Vec<CompileRequest>>,
    fail_after: Option<usize>,
}

impl RecordingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed for the first `n` compile calls, then fail.
    pub fn failing_after(n: usize) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_after: Some(n),
        }
    }

    pub fn requests(&self) -> Vec<CompileRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl SchemaCompiler for RecordingCompiler {
    fn compile(&self, req: &CompileRequest) -> anyhow::Result<()> {
        let mut requests = self.requests.lock().expect("requests lock");
        requests.push(req.clone());
        if let Some(n) = self.fail_after
            && requests.len() > n
        {
            anyhow::bail!("simulated compiler failure");
        }
        Ok(())
    }

    fn check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Returns canned bytes instead of spawning a generator.
#[derive(Debug)]
pub struct RecordingBundler {
    output: Vec<u8>,
    fail: bool,
    calls: Mutex<Vec<Utf8PathBuf>>,
}

impl RecordingBundler {
    pub fn returning(output: &[u8]) -> Self {
        Self {
            output: output.to_vec(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            output: Vec::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Utf8PathBuf> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl BundleGenerator for RecordingBundler {
    fn generate(&self, working_dir: &Utf8Path) -> Result<Vec<u8>, DriveError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(working_dir.to_path_buf());
        if self.fail {
            return Err(DriveError::GeneratorFailed {
                message: "simulated generator failure".to_string(),
            });
        }
        Ok(self.output.clone())
    }
}
