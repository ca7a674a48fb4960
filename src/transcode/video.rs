//! Video re-encoding through an external `ffmpeg`.
//!
//! The [`Toolchain`] is the heavyweight resource: it is probed once with
//! [`Toolchain::ensure_loaded`] and then reused for every run. Each run gets
//! a private scratch directory that plays the role of the toolchain's
//! filesystem: the input is written in, the toolchain is invoked with
//! relative names, and the output is read back out.
//!
//! Child processes are spawned with `kill_on_drop`, so abandoning a run (for
//! example when the timeout fires) also kills the toolchain.

use super::{Transcoded, Transcoder};
use crate::constants::{
    DEFAULT_CRF, DEFAULT_FFMPEG, DEFAULT_VIDEO_CODEC, MAX_CRF, TOOLCHAIN_LOG_NAME,
    TOOLCHAIN_LOG_TAIL_LINES, VIDEO_MIME, VIDEO_OUTPUT_NAME,
};
use crate::error::{LabError, Result};
use crate::handle::sanitize_file_name;
use crate::selection::SelectedFile;
use async_trait::async_trait;
use std::ffi::OsString;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOptions {
    pub codec: String,
    /// Constant rate factor: 0 is lossless, 51 is the smallest output.
    pub crf: u8,
    /// Deadline for the whole run, toolchain probe included.
    pub timeout: Option<Duration>,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            crf: DEFAULT_CRF,
            timeout: None,
        }
    }
}

impl VideoOptions {
    pub fn new(codec: Option<String>, crf: Option<u8>, timeout: Option<Duration>) -> Result<Self> {
        let crf = crf.unwrap_or(DEFAULT_CRF);
        if crf > MAX_CRF {
            return Err(LabError::InvalidCrf(crf));
        }
        Ok(Self {
            codec: codec.unwrap_or_else(|| DEFAULT_VIDEO_CODEC.to_string()),
            crf,
            timeout,
        })
    }

    /// Command line for one run, relative to the scratch directory.
    pub fn arguments(&self, input_name: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            input_name.to_string(),
            "-vcodec".to_string(),
            self.codec.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            VIDEO_OUTPUT_NAME.to_string(),
        ]
    }
}

/// Awaits `task`, giving up with [`LabError::Timeout`] once `limit` passes.
pub async fn with_deadline<T, F>(limit: Option<Duration>, task: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        None => task.await,
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| LabError::Timeout(limit))?,
    }
}

/// A lazily probed external media toolchain.
///
/// `launcher` is the program to execute, optionally followed by fixed leading
/// arguments (for example `["sh", "wrapper.sh"]`).
#[derive(Debug)]
pub struct Toolchain {
    launcher: Vec<OsString>,
    version: OnceCell<String>,
    probes: AtomicUsize,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG)
    }
}

impl Toolchain {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self::with_launcher(vec![program.into()])
    }

    pub fn with_launcher(launcher: Vec<OsString>) -> Self {
        let launcher = if launcher.is_empty() {
            vec![OsString::from(DEFAULT_FFMPEG)]
        } else {
            launcher
        };
        Self {
            launcher,
            version: OnceCell::new(),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn program(&self) -> String {
        self.launcher[0].to_string_lossy().into_owned()
    }

    pub fn is_loaded(&self) -> bool {
        self.version.initialized()
    }

    /// Number of successful probes; stays at 1 however often
    /// [`ensure_loaded`](Self::ensure_loaded) is called.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Probes the toolchain on first use and returns its version banner.
    /// Later calls return the cached banner without spawning anything. A
    /// probe that is abandoned midway leaves the toolchain unloaded.
    pub async fn ensure_loaded(&self) -> Result<&str> {
        let version = self.version.get_or_try_init(|| self.probe()).await?;
        Ok(version)
    }

    async fn probe(&self) -> Result<String> {
        let output = self
            .command()
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| LabError::ToolchainUnavailable {
                program: self.program(),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(LabError::ToolchainUnavailable {
                program: self.program(),
                reason: format!("version probe exited with {}", output.status),
            });
        }

        let banner = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("unknown version")
            .trim()
            .to_string();
        self.probes.fetch_add(1, Ordering::SeqCst);
        crate::verbose!("Loaded toolchain: {}", banner);
        Ok(banner)
    }

    /// Runs the toolchain inside `workdir`. Its stderr goes to a log file in
    /// the same directory; on failure the tail of that log becomes the error.
    pub async fn run(&self, workdir: &Path, args: &[String]) -> Result<()> {
        let log_path = workdir.join(TOOLCHAIN_LOG_NAME);
        let log = tokio::fs::File::create(&log_path).await?.into_std().await;

        let mut child = self
            .command()
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|e| LabError::ToolchainUnavailable {
                program: self.program(),
                reason: e.to_string(),
            })?;
        let status = child.wait().await?;

        let tail = log_tail(&log_path).await;
        if crate::logger::is_verbose() {
            for line in tail.lines() {
                crate::verbose!("[{}] {}", self.program(), line);
            }
        }

        if !status.success() {
            return Err(LabError::ToolchainFailed(format!(
                "{} exited with {}: {}",
                self.program(),
                status,
                tail.trim()
            )));
        }
        Ok(())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.launcher[0]);
        command.args(&self.launcher[1..]).kill_on_drop(true);
        command
    }
}

async fn log_tail(path: &Path) -> String {
    let content = tokio::fs::read_to_string(path).await.unwrap_or_default();
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(TOOLCHAIN_LOG_TAIL_LINES);
    lines[start..].join("\n")
}

/// Name the input is written under inside the scratch directory. It must
/// not collide with the output or log, and must not look like an option.
fn scratch_input_name(original: &str) -> String {
    let name = sanitize_file_name(original);
    if name == VIDEO_OUTPUT_NAME || name == TOOLCHAIN_LOG_NAME || name.starts_with('-') {
        format!("input-{}", name)
    } else {
        name
    }
}

pub struct VideoCompressor {
    options: VideoOptions,
    toolchain: Arc<Toolchain>,
}

impl Default for VideoCompressor {
    fn default() -> Self {
        Self::new(VideoOptions::default(), Arc::new(Toolchain::default()))
    }
}

impl VideoCompressor {
    pub fn new(options: VideoOptions, toolchain: Arc<Toolchain>) -> Self {
        Self { options, toolchain }
    }

    pub fn toolchain(&self) -> &Arc<Toolchain> {
        &self.toolchain
    }

    pub fn options(&self) -> &VideoOptions {
        &self.options
    }

    /// Loads the toolchain if needed and re-encodes `file`, all under the
    /// configured timeout.
    pub async fn compress(&self, file: &SelectedFile) -> Result<Transcoded> {
        with_deadline(self.options.timeout, self.compress_unbounded(file)).await
    }

    async fn compress_unbounded(&self, file: &SelectedFile) -> Result<Transcoded> {
        self.toolchain.ensure_loaded().await?;

        let scratch = TempDir::new()?;
        let input_name = scratch_input_name(file.name());
        tokio::fs::write(scratch.path().join(&input_name), file.bytes()).await?;

        let args = self.options.arguments(&input_name);
        crate::verbose!("Running {} {}", self.toolchain.program(), args.join(" "));
        self.toolchain.run(scratch.path(), &args).await?;

        let bytes = tokio::fs::read(scratch.path().join(VIDEO_OUTPUT_NAME))
            .await
            .map_err(|e| {
                LabError::ToolchainFailed(format!("{} was not produced: {}", VIDEO_OUTPUT_NAME, e))
            })?;

        Ok(Transcoded {
            bytes,
            file_name: VIDEO_OUTPUT_NAME.to_string(),
            mime: VIDEO_MIME.to_string(),
        })
    }
}

#[async_trait]
impl Transcoder for VideoCompressor {
    fn label(&self) -> &'static str {
        "ffmpeg"
    }

    /// Blocking entry point for callers outside a runtime; drives
    /// [`compress`](VideoCompressor::compress) on a private current-thread
    /// runtime.
    fn transcode(&self, file: &SelectedFile) -> Result<Transcoded> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.compress(file))
    }

    async fn transcode_async(self: Arc<Self>, file: SelectedFile) -> Result<Transcoded> {
        self.compress(&file).await
    }
}
