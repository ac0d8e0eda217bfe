//! Background sync helper.
//!
//! The helper is an unsupervised child: spawned once at startup, never
//! restarted, never health-checked, never awaited. Nothing in the ingest
//! pipeline depends on it and its exit status is not observed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tracing::info;

use crate::config::SyncHelperConfig;

#[derive(Debug, Error)]
pub enum HelperError {
    #[error("Failed to start sync helper {command}: {source}")]
    SpawnFailed {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to a spawned helper. Holds no process handle; it cannot be waited
/// on or killed through this type.
#[derive(Debug, Clone)]
pub struct UnsupervisedChild {
    command: PathBuf,
    pid: Option<u32>,
}

impl UnsupervisedChild {
    pub fn command(&self) -> &Path {
        &self.command
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// Starts the helper if enabled. Returns `Ok(None)` when disabled.
///
/// Must be called from within a tokio runtime; the runtime reaps the child
/// when it exits.
pub fn spawn_sync_helper(
    config: &SyncHelperConfig,
) -> Result<Option<UnsupervisedChild>, HelperError> {
    if !config.enabled {
        return Ok(None);
    }

    let child = tokio::process::Command::new(&config.command)
        .args(&config.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false)
        .spawn()
        .map_err(|source| HelperError::SpawnFailed {
            command: config.command.clone(),
            source,
        })?;

    let helper = UnsupervisedChild {
        command: config.command.clone(),
        pid: child.id(),
    };
    info!(
        "Started sync helper {} (pid {:?}, unsupervised)",
        helper.command.display(),
        helper.pid
    );
    Ok(Some(helper))
}
