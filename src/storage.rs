//! On-disk home of generated `.drawio` files.
//!
//! Artifacts are written under random names, served back by exact name and
//! swept once they are older than the configured age.

use crate::config::CleanupConfig;
use crate::error::{Error, Result};
use crate::ids::IdSource;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

pub const ARTIFACT_EXTENSION: &str = "drawio";
pub const CONTENT_TYPE: &str = "application/xml";
const EDITOR_URL: &str = "https://app.diagrams.net/";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` as `<uuid>.drawio` and returns the file name.
    pub fn save(&self, bytes: &[u8], ids: &dyn IdSource) -> Result<String> {
        std::fs::create_dir_all(&self.root)?;
        let file_name = format!("{}.{ARTIFACT_EXTENSION}", ids.artifact_stem());
        std::fs::write(self.root.join(&file_name), bytes)?;
        tracing::info!(file = %file_name, bytes = bytes.len(), "saved drawio artifact");
        Ok(file_name)
    }

    pub fn load(&self, file_name: &str) -> Result<Vec<u8>> {
        validate_file_name(file_name)?;
        let path = self.root.join(file_name);
        if !path.is_file() {
            tracing::warn!(file = %file_name, "file not found");
            return Err(Error::NotFound(file_name.to_string()));
        }
        Ok(std::fs::read(path)?)
    }

    /// Number of artifacts `cleanup` would delete right now.
    pub fn stale_count(&self, max_age: Duration) -> Result<usize> {
        Ok(self.stale_files(max_age)?.len())
    }

    /// Deletes artifacts last written more than `max_age` ago. A file that
    /// cannot be removed is logged and skipped.
    pub fn cleanup(&self, max_age: Duration) -> Result<usize> {
        let mut deleted = 0;
        for path in self.stale_files(max_age)? {
            let name = path.file_name().and_then(OsStr::to_str).unwrap_or_default().to_string();
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    deleted += 1;
                    tracing::info!(file = %name, "deleted old file");
                }
                Err(err) => tracing::warn!(file = %name, error = %err, "failed to delete file"),
            }
        }
        if deleted > 0 {
            tracing::info!(
                deleted,
                max_age_minutes = max_age.as_secs() / 60,
                "deleted old files"
            );
        } else {
            tracing::debug!("no old files found for cleanup");
        }
        Ok(deleted)
    }

    fn stale_files(&self, max_age: Duration) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            tracing::warn!(path = %self.root.display(), "storage directory does not exist");
            return Ok(Vec::new());
        }
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return Ok(Vec::new());
        };

        let mut stale = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(OsStr::to_str) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            let metadata = entry.metadata()?;
            if metadata.is_file() && metadata.modified()? < cutoff {
                stale.push(path);
            }
        }
        Ok(stale)
    }
}

/// Accepts only plain `*.drawio` names: no traversal, no directories.
pub fn validate_file_name(file_name: &str) -> Result<()> {
    let invalid = file_name.is_empty()
        || file_name.contains("..")
        || file_name.contains(['/', '\\'])
        || Path::new(file_name).extension().and_then(OsStr::to_str) != Some(ARTIFACT_EXTENSION);
    if invalid {
        return Err(Error::InvalidFileName(file_name.to_string()));
    }
    Ok(())
}

/// Link that opens a stored artifact in the web diagram editor.
pub fn edit_link(external_url: &str, file_name: &str) -> String {
    let base = external_url.trim_end_matches('/');
    format!("{EDITOR_URL}?url={base}/api/files/get/{file_name}")
}

/// Background thread deleting stale artifacts on a fixed schedule.
pub struct Sweeper {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    pub fn spawn(store: ArtifactStore, cleanup: CleanupConfig) -> Result<Self> {
        let (stop, stop_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("drawio-sweeper".to_string())
            .spawn(move || sweep_loop(&store, &cleanup, &stop_rx))?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Wakes the thread and waits for it to finish the current cycle.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("sweeper thread panicked");
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sweep_loop(store: &ArtifactStore, cleanup: &CleanupConfig, stop: &mpsc::Receiver<()>) {
    tracing::info!(
        interval_minutes = cleanup.interval_minutes,
        max_age_minutes = cleanup.max_age_minutes,
        "file sweeper started"
    );
    if stopped(stop, cleanup.initial_delay()) {
        return;
    }
    loop {
        tracing::debug!("starting cleanup cycle");
        if let Err(err) = store.cleanup(cleanup.max_age()) {
            tracing::error!(error = %err, "cleanup cycle failed");
        }
        if stopped(stop, cleanup.interval()) {
            tracing::info!("file sweeper stopped");
            return;
        }
    }
}

/// Sleeps up to `timeout`; true once the owner asked the loop to end.
fn stopped(stop: &mpsc::Receiver<()>, timeout: Duration) -> bool {
    !matches!(stop.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
}
