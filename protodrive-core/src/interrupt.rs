//! Ctrl-C cleanup for the in-progress staging tree.
//!
//! Staging trees are removed by RAII on every in-process exit path. An
//! interrupt bypasses unwinding, so the live tree registers itself here and
//! the signal handler removes it before terminating. The OS temp reaper
//! remains the backstop if even that fails.

use camino::Utf8Path;
use std::path::PathBuf;
use std::sync::Mutex;

// At most one staging tree exists at a time (jobs run sequentially).
static ACTIVE_TREE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Install the process-wide interrupt handler. Call once at startup; the
/// process exits with status 1 on interrupt.
pub fn install_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if let Ok(mut active) = ACTIVE_TREE.lock()
            && let Some(path) = active.take()
        {
            let _ = std::fs::remove_dir_all(&path);
        }
        std::process::exit(1);
    })
    .map_err(|e| anyhow::anyhow!("install interrupt handler: {e}"))
}

pub(crate) fn register(path: &Utf8Path) {
    if let Ok(mut active) = ACTIVE_TREE.lock() {
        *active = Some(path.as_std_path().to_path_buf());
    }
}

pub(crate) fn unregister(path: &Utf8Path) {
    if let Ok(mut active) = ACTIVE_TREE.lock()
        && active.as_deref() == Some(path.as_std_path())
    {
        *active = None;
    }
}
