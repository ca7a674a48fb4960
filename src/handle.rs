//! Downloadable results.
//!
//! A [`DownloadHandle`] owns a temporary file holding one transcode result.
//! Dropping the handle deletes the file, so a workbench releases the previous
//! result simply by replacing it. A [`HandleTracker`] counts live handles.

use crate::constants::DOWNLOAD_PREFIX;
use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempPath;

#[derive(Debug, Clone, Default)]
pub struct HandleTracker {
    live: Arc<AtomicUsize>,
}

impl HandleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created through this tracker and not yet dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Writes `bytes` to a fresh temporary file and returns a handle to it.
    pub fn acquire(&self, file_name: &str, mime: &str, bytes: &[u8]) -> Result<DownloadHandle> {
        let mut file = tempfile::Builder::new()
            .prefix(DOWNLOAD_PREFIX)
            .suffix(&format!("-{}", sanitize_file_name(file_name)))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(DownloadHandle {
            path: file.into_temp_path(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            size: bytes.len() as u64,
            live: Arc::clone(&self.live),
        })
    }
}

#[derive(Debug)]
pub struct DownloadHandle {
    path: TempPath,
    file_name: String,
    mime: String,
    size: u64,
    live: Arc<AtomicUsize>,
}

impl DownloadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the result should be saved under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Copies the result to `destination`, creating parent directories.
    pub fn save_to(&self, destination: &Path) -> Result<u64> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(fs::copy(&self.path, destination)?)
    }
}

impl Drop for DownloadHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Keeps only the final path component and replaces characters that are
/// awkward in temp file names.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "result".to_string()
    } else {
        cleaned
    }
}
