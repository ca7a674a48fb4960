//! One compression "page": file intake, a single transcoder, and the result
//! currently on display.
//!
//! A workbench moves through `Idle → Processing → Done | Failed`. Only one
//! submission may be in flight at a time; a second one is rejected with
//! [`LabError::Busy`] instead of racing the first for the displayed state.
//! Each successful result owns a [`DownloadHandle`], and the previous handle
//! is released as soon as a new result replaces it.

use crate::error::{FailureKind, LabError, Result};
use crate::handle::{DownloadHandle, HandleTracker};
use crate::report::{size_mb, TranscodeReport};
use crate::selection::SelectedFile;
use crate::transcode::Transcoder;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Processing,
    Done,
    Failed { kind: FailureKind, message: String },
}

impl Phase {
    pub fn is_failed(&self) -> bool {
        matches!(self, Phase::Failed { .. })
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Processing => write!(f, "in progress"),
            Phase::Done => write!(f, "done"),
            Phase::Failed { message, .. } => write!(f, "failed: {}", message),
        }
    }
}

/// Snapshot of what the workbench currently displays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbenchView {
    pub phase: Phase,
    pub original_mb: Option<f64>,
    pub compressed_mb: Option<f64>,
    pub elapsed: Option<Duration>,
    pub download: Option<PathBuf>,
    pub download_name: Option<String>,
}

#[derive(Default)]
struct State {
    phase: Phase,
    original_mb: Option<f64>,
    compressed_mb: Option<f64>,
    elapsed: Option<Duration>,
    handle: Option<DownloadHandle>,
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Workbench {
    name: &'static str,
    transcoder: Arc<dyn Transcoder>,
    state: Mutex<State>,
    in_flight: AtomicBool,
    handles: HandleTracker,
}

impl Workbench {
    pub fn new(name: &'static str, transcoder: impl Transcoder + 'static) -> Self {
        Self::from_arc(name, Arc::new(transcoder))
    }

    pub fn from_arc(name: &'static str, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            name,
            transcoder,
            state: Mutex::new(State::default()),
            in_flight: AtomicBool::new(false),
            handles: HandleTracker::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn transcoder_label(&self) -> &'static str {
        self.transcoder.label()
    }

    pub fn handles(&self) -> &HandleTracker {
        &self.handles
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> Phase {
        self.state().phase.clone()
    }

    pub fn view(&self) -> WorkbenchView {
        let state = self.state();
        WorkbenchView {
            phase: state.phase.clone(),
            original_mb: state.original_mb,
            compressed_mb: state.compressed_mb,
            elapsed: state.elapsed,
            download: state.handle.as_ref().map(|h| h.path().to_path_buf()),
            download_name: state.handle.as_ref().map(|h| h.file_name().to_string()),
        }
    }

    /// Transcodes an already-read selection. `None` means the user picked
    /// nothing: the phase turns `Failed`, sizes stay as they were, and the
    /// transcoder is not invoked.
    pub async fn submit(&self, selection: Option<SelectedFile>) -> Result<TranscodeReport> {
        let _guard = self.begin()?;
        let started = Instant::now();
        self.process(started, selection).await
    }

    /// Reads `path` fully into memory, then transcodes it.
    pub async fn submit_path(&self, path: Option<&Path>) -> Result<TranscodeReport> {
        let _guard = self.begin()?;
        let started = Instant::now();

        let selection = match path {
            None => None,
            Some(path) => match SelectedFile::from_path(path).await {
                Ok(file) => Some(file),
                Err(e) => return Err(self.fail(e)),
            },
        };
        self.process(started, selection).await
    }

    /// Copies the current result to `destination`.
    pub fn save_download(&self, destination: &Path) -> Result<u64> {
        let state = self.state();
        let handle = state.handle.as_ref().ok_or(LabError::NoResult)?;
        handle.save_to(destination)
    }

    /// Releases the current download handle and returns to `Idle`.
    pub fn teardown(&self) {
        let released = std::mem::take(&mut *self.state());
        if let Some(handle) = released.handle {
            crate::verbose!("[{}] released {}", self.name, handle.path().display());
        }
    }

    fn begin(&self) -> Result<FlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            crate::warn!("[{}] busy, submission rejected", self.name);
            return Err(LabError::Busy);
        }
        self.state().phase = Phase::Processing;
        Ok(FlightGuard(&self.in_flight))
    }

    async fn process(
        &self,
        started: Instant,
        selection: Option<SelectedFile>,
    ) -> Result<TranscodeReport> {
        let file = selection.ok_or_else(|| self.fail(LabError::NoFileSelected))?;
        let original_bytes = file.size();
        self.state().original_mb = Some(size_mb(original_bytes));
        crate::verbose!(
            "[{}] {} ({} bytes, {}) -> {}",
            self.name,
            file.name(),
            original_bytes,
            file.mime(),
            self.transcoder.label()
        );

        let output = match Arc::clone(&self.transcoder).transcode_async(file).await {
            Ok(output) => output,
            Err(e) => return Err(self.fail(e)),
        };

        let handle = match self.handles.acquire(&output.file_name, &output.mime, &output.bytes) {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(e)),
        };
        let elapsed = started.elapsed();

        let report = TranscodeReport {
            transcoder: self.transcoder.label(),
            original_bytes,
            compressed_bytes: output.bytes.len() as u64,
            file_name: output.file_name,
            mime: output.mime,
            download: handle.path().to_path_buf(),
            elapsed,
        };

        let previous = {
            let mut state = self.state();
            state.compressed_mb = Some(report.compressed_mb());
            state.elapsed = Some(elapsed);
            state.phase = Phase::Done;
            state.handle.replace(handle)
        };
        // Dropping the superseded handle deletes its file.
        drop(previous);

        Ok(report)
    }

    /// Records a failure as the visible phase and logs it. Displayed sizes
    /// and the current download are left as they were.
    fn fail(&self, error: LabError) -> LabError {
        crate::error!("[{}] {}", self.name, error);
        self.state().phase = Phase::Failed {
            kind: error.kind(),
            message: error.to_string(),
        };
        error
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
