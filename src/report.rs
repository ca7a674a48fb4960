//! Size and timing figures shown after a transcode.
//!
//! Every displayed size goes through [`size_mb`], so "before" and "after"
//! values are always comparable.

use crate::constants::{
    BYTES_PER_MB, COMPRESSED_SIZE_PREFIX, COMPRESSION_RATIO_PREFIX, DOWNLOAD_PREFIX_MSG,
    ELAPSED_PREFIX, ORIGINAL_SIZE_PREFIX, PROGRESS_SPINNER_TEMPLATE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Converts a byte count to megabytes rounded to two decimal places.
///
/// # Example
/// ```
/// use squeeze_lab::report::size_mb;
///
/// assert_eq!(size_mb(10 * 1024 * 1024), 10.0);
/// assert_eq!(size_mb(1536 * 1024), 1.5);
/// ```
pub fn size_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Elapsed time in seconds with two decimals, e.g. `"1.25"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64())
}

/// Compression ratio as a percentage (positive means reduction, negative means increase)
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

/// Outcome of one successful workbench submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeReport {
    pub transcoder: &'static str,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub file_name: String,
    pub mime: String,
    /// Temporary file holding the result. Deleted once the workbench
    /// replaces the result or is torn down.
    pub download: PathBuf,
    pub elapsed: Duration,
}

impl TranscodeReport {
    pub fn original_mb(&self) -> f64 {
        size_mb(self.original_bytes)
    }

    pub fn compressed_mb(&self) -> f64 {
        size_mb(self.compressed_bytes)
    }

    pub fn ratio(&self) -> f64 {
        calculate_compression_ratio(self.original_bytes, self.compressed_bytes)
    }

    /// Lines printed by the CLI, without the elapsed line which only the
    /// video workbench shows.
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("{} {} MB", ORIGINAL_SIZE_PREFIX, self.original_mb()),
            format!("{} {} MB", COMPRESSED_SIZE_PREFIX, self.compressed_mb()),
            format!("{} {:.1}%", COMPRESSION_RATIO_PREFIX, self.ratio()),
        ]
    }

    pub fn elapsed_line(&self) -> String {
        format!("{} {} s", ELAPSED_PREFIX, format_elapsed(self.elapsed))
    }

    pub fn download_line(&self) -> String {
        format!("{} {} ({})", DOWNLOAD_PREFIX_MSG, self.file_name, self.mime)
    }
}

pub fn create_progress_spinner(message: &str) -> ProgressBar {
    let pb = if crate::logger::is_quiet() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mb_rounding() {
        assert_eq!(size_mb(0), 0.0);
        assert_eq!(size_mb(1024 * 1024), 1.0);
        // 5 KiB ~= 0.0049 MB
        assert_eq!(size_mb(5 * 1024), 0.0);
        // 6 KiB ~= 0.0059 MB
        assert_eq!(size_mb(6 * 1024), 0.01);
        assert_eq!(size_mb(2_621_440), 2.5);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1234)), "1.23");
        assert_eq!(format_elapsed(Duration::ZERO), "0.00");
    }

    #[test]
    fn test_calculate_compression_ratio() {
        assert_eq!(calculate_compression_ratio(0, 10), 0.0);
        assert_eq!(calculate_compression_ratio(100, 25), 75.0);
        assert!(calculate_compression_ratio(100, 150) < 0.0);
    }

    #[test]
    fn test_summary_lines() {
        let report = TranscodeReport {
            transcoder: "zlib+gzip",
            original_bytes: 10 * 1024 * 1024,
            compressed_bytes: 1024 * 1024,
            file_name: "data.bin".into(),
            mime: "application/octet-stream".into(),
            download: PathBuf::from("/tmp/x"),
            elapsed: Duration::from_millis(500),
        };
        let lines = report.summary_lines();
        assert_eq!(lines[0], "📊 Before: 10 MB");
        assert_eq!(lines[1], "📈 After: 1 MB");
        assert_eq!(report.elapsed_line(), "⏱️  Processing time: 0.50 s");
    }
}
