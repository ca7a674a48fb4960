//! Command runners behind the CLI: each builds a workbench, submits the
//! selected file, and prints the result.

use crate::cli::FileMethod;
use crate::constants::{INFO_PREFIX, STATUS_PREFIX};
use crate::error::{LabError, Result};
use crate::report::{
    calculate_compression_ratio, create_progress_spinner, format_elapsed, size_mb, TranscodeReport,
};
use crate::selection::SelectedFile;
use crate::transcode::{
    ByteCompressor, ByteOptions, CommandHeicConverter, ImageCompressor, ImageOptions, StreamCodec,
    StreamCompressor, Toolchain, Transcoder, VideoCompressor, VideoOptions,
};
use crate::workbench::{Phase, Workbench};
use crate::{info, verbose};
use rayon::prelude::*;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Settings of the `video` command.
#[derive(Debug, Clone, Default)]
pub struct VideoSettings {
    pub codec: Option<String>,
    pub crf: Option<u8>,
    pub ffmpeg: Option<String>,
    pub ffmpeg_args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

/// `level` only applies to `zlib` and `codec` only to `stream`; passing
/// either to the other method is rejected rather than ignored.
pub fn file_workbench(
    method: FileMethod,
    level: Option<u8>,
    codec: Option<&str>,
) -> Result<Workbench> {
    let transcoder: Arc<dyn Transcoder> = match (method, level, codec) {
        (FileMethod::Zlib, _, Some(_)) => {
            return Err(LabError::ConflictingOptions(
                "--codec only applies to -m stream".to_string(),
            ))
        }
        (FileMethod::Stream, Some(_), _) => {
            return Err(LabError::ConflictingOptions(
                "--level only applies to -m zlib".to_string(),
            ))
        }
        (FileMethod::Zlib, level, None) => {
            Arc::new(ByteCompressor::new(ByteOptions::new(level, true)?))
        }
        (FileMethod::Stream, None, codec) => {
            let codec = codec
                .map(str::parse::<StreamCodec>)
                .transpose()?
                .unwrap_or_default();
            Arc::new(StreamCompressor::new(codec))
        }
    };
    Ok(Workbench::from_arc("file", transcoder))
}

pub fn image_workbench(
    max_size_mb: Option<f64>,
    max_dimension: Option<u32>,
    heif_convert: Option<PathBuf>,
) -> Result<Workbench> {
    let options = ImageOptions::new(max_size_mb, max_dimension)?;
    let converter = heif_convert
        .map(CommandHeicConverter::new)
        .unwrap_or_default();
    Ok(Workbench::new(
        "image",
        ImageCompressor::with_converter(options, Arc::new(converter)),
    ))
}

pub fn video_workbench(settings: VideoSettings) -> Result<Workbench> {
    let options = VideoOptions::new(
        settings.codec,
        settings.crf,
        settings.timeout_secs.map(Duration::from_secs),
    )?;
    let mut launcher: Vec<OsString> = settings.ffmpeg.into_iter().map(OsString::from).collect();
    if launcher.is_empty() && !settings.ffmpeg_args.is_empty() {
        launcher.push(OsString::from(crate::constants::DEFAULT_FFMPEG));
    }
    launcher.extend(settings.ffmpeg_args.into_iter().map(OsString::from));
    let toolchain = Arc::new(Toolchain::with_launcher(launcher));
    Ok(Workbench::new("video", VideoCompressor::new(options, toolchain)))
}

/// Submits `input` to `bench`, prints the outcome, saves the result when
/// `output` is given, and releases the workbench's download handle.
///
/// The returned report's `download` path is already deleted by then; the
/// result survives only at `output`.
pub async fn run_workbench(
    bench: &Workbench,
    input: Option<&Path>,
    output: Option<&Path>,
    show_timing: bool,
) -> Result<TranscodeReport> {
    info!(
        "🗜️  {} workbench using {}",
        bench.name(),
        bench.transcoder_label()
    );
    if let Some(path) = input {
        info!("📁 Input: {:?}", path);
    }

    let spinner = create_progress_spinner(&format!("{} {}", STATUS_PREFIX, Phase::Processing));
    let outcome = bench.submit_path(input).await;
    spinner.finish_and_clear();

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            info!("{} {}", STATUS_PREFIX, bench.phase());
            return Err(e);
        }
    };

    for line in report.summary_lines() {
        info!("{}", line);
    }
    if show_timing {
        info!("{} {}", STATUS_PREFIX, bench.phase());
        info!("{}", report.elapsed_line());
    }

    if let Some(destination) = output {
        let written = bench.save_download(destination)?;
        info!("{} saved {} bytes to {:?}", report.download_line(), written, destination);
    } else {
        verbose!("{} (pass --output to keep it)", report.download_line());
    }

    bench.teardown();
    Ok(report)
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub technique: &'static str,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub elapsed: Duration,
}

/// Runs zlib+gzip and every streaming codec on the same file in parallel.
pub fn compare_techniques(file: &SelectedFile, level: Option<u8>) -> Result<Vec<ComparisonRow>> {
    let mut transcoders: Vec<Box<dyn Transcoder>> = vec![Box::new(ByteCompressor::new(
        ByteOptions::new(level, true)?,
    ))];
    for codec in StreamCodec::all() {
        transcoders.push(Box::new(StreamCompressor::new(codec)));
    }

    transcoders
        .par_iter()
        .map(|transcoder| {
            let start = Instant::now();
            let output = transcoder.transcode(file)?;
            Ok(ComparisonRow {
                technique: transcoder.label(),
                original_bytes: file.size(),
                compressed_bytes: output.bytes.len() as u64,
                elapsed: start.elapsed(),
            })
        })
        .collect()
}

pub async fn compare(input: &Path, level: Option<u8>) -> Result<Vec<ComparisonRow>> {
    let file = SelectedFile::from_path(input).await?;
    info!("⚖️  Comparing techniques on {:?} ({} MB)", input, size_mb(file.size()));

    let rows = tokio::task::spawn_blocking(move || compare_techniques(&file, level))
        .await
        .map_err(|e| LabError::TaskJoin(e.to_string()))??;
    info!("{:<20} {:>10} {:>10} {:>8} {:>8}", "technique", "before", "after", "ratio", "secs");
    for row in &rows {
        info!(
            "{:<20} {:>7} MB {:>7} MB {:>7.1}% {:>8}",
            row.technique,
            size_mb(row.original_bytes),
            size_mb(row.compressed_bytes),
            calculate_compression_ratio(row.original_bytes, row.compressed_bytes),
            format_elapsed(row.elapsed)
        );
    }
    if let Some(best) = rows.iter().min_by_key(|row| row.compressed_bytes) {
        info!("🏆 Smallest: {} ({} bytes)", best.technique, best.compressed_bytes);
    }
    Ok(rows)
}

/// Which workbench a MIME type belongs on.
pub fn suggested_workbench(mime: &str) -> &'static str {
    if mime.starts_with("image/") {
        "image"
    } else if mime.starts_with("video/") {
        "video"
    } else {
        "file"
    }
}

pub async fn show_info(input: &Path) -> Result<()> {
    let file = SelectedFile::from_path(input).await?;
    info!("{} File: {}", INFO_PREFIX, file.name());
    info!("  📦 Size: {} bytes ({} MB)", file.size(), size_mb(file.size()));
    info!("  🎭 MIME type: {}", file.mime());
    info!("  🔁 HEIC conversion: {}", if file.is_heic() { "yes" } else { "no" });
    info!("  🧭 Suggested workbench: {}", suggested_workbench(file.mime()));
    Ok(())
}
