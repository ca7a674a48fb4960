mod common;

use common::{compressible_bytes, encode_image, gradient_image, write_fake_ffmpeg};
use image::ImageFormat;
use squeeze_lab::{
    ByteCompressor, FailureKind, HeicConverter, ImageCompressor, ImageOptions, LabError, Phase,
    Result, SelectedFile, Toolchain, Transcoded, Transcoder, VideoCompressor, VideoOptions,
    Workbench,
};
use std::ffi::OsString;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Copies its input after a pause, failing on names starting with `bad`.
struct SlowCopy(Duration);

impl Transcoder for SlowCopy {
    fn label(&self) -> &'static str {
        "slow-copy"
    }

    fn transcode(&self, file: &SelectedFile) -> Result<Transcoded> {
        thread::sleep(self.0);
        if file.name().starts_with("bad") {
            return Err(LabError::ToolchainFailed("refused".to_string()));
        }
        Ok(Transcoded {
            bytes: file.bytes().to_vec(),
            file_name: file.name().to_string(),
            mime: file.mime().to_string(),
        })
    }
}

struct StubConverter(Vec<u8>);

impl HeicConverter for StubConverter {
    fn to_jpeg(&self, _heic: &[u8]) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

struct BrokenConverter;

impl HeicConverter for BrokenConverter {
    fn to_jpeg(&self, _heic: &[u8]) -> Result<Vec<u8>> {
        Err(LabError::FormatConversion("not a HEIF container".to_string()))
    }
}

fn text(name: &str, len: usize) -> SelectedFile {
    SelectedFile::from_bytes(name, compressible_bytes(len))
}

async fn wait_until_busy(bench: &Workbench) {
    for _ in 0..200 {
        if bench.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("workbench never started processing");
}

#[tokio::test]
async fn test_second_submission_is_rejected_while_busy() {
    let bench = Arc::new(Workbench::new("file", SlowCopy(Duration::from_millis(300))));

    let first = tokio::spawn({
        let bench = Arc::clone(&bench);
        async move { bench.submit(Some(text("a.txt", 100))).await }
    });
    wait_until_busy(&bench).await;
    assert_eq!(bench.phase(), Phase::Processing);

    let second = bench.submit(Some(text("b.txt", 100))).await;
    assert!(matches!(second, Err(LabError::Busy)));
    // The rejection does not disturb the running submission.
    assert_eq!(bench.phase(), Phase::Processing);

    let report = first.await.unwrap().unwrap();
    assert_eq!(report.file_name, "a.txt");
    assert_eq!(bench.phase(), Phase::Done);
    assert!(!bench.is_busy());
}

#[tokio::test]
async fn test_resubmission_releases_superseded_handle() {
    let bench = Workbench::new("file", ByteCompressor::default());

    bench.submit(Some(text("one.log", 10_000))).await.unwrap();
    let first = bench.view().download.unwrap();
    assert!(first.exists());

    bench.submit(Some(text("two.log", 20_000))).await.unwrap();
    let second = bench.view().download.unwrap();

    assert!(!first.exists());
    assert!(second.exists());
    assert_eq!(bench.handles().live(), 1);
    assert_eq!(bench.view().download_name.as_deref(), Some("two.log"));
}

#[tokio::test]
async fn test_failure_keeps_previous_result() {
    let bench = Workbench::new("file", SlowCopy(Duration::ZERO));

    bench.submit(Some(text("good.txt", 2 * 1024 * 1024))).await.unwrap();
    let before = bench.view();

    let result = bench.submit(Some(text("bad.txt", 100))).await;
    assert!(result.is_err());

    let after = bench.view();
    assert!(matches!(
        after.phase,
        Phase::Failed {
            kind: FailureKind::Transcoder,
            ..
        }
    ));
    assert_eq!(after.compressed_mb, before.compressed_mb);
    assert_eq!(after.download, before.download);
    assert!(after.download.unwrap().exists());
}

#[tokio::test]
async fn test_no_selection_never_reaches_transcoder() {
    let bench = Workbench::new("file", SlowCopy(Duration::from_secs(30)));

    let result = bench.submit(None).await;

    assert!(matches!(result, Err(LabError::NoFileSelected)));
    assert!(!bench.is_busy());
    assert_eq!(bench.view().compressed_mb, None);
}

#[tokio::test]
async fn test_ten_megabyte_file_at_max_level() {
    let bench = Workbench::new("file", ByteCompressor::default());

    let report = bench.submit(Some(text("big.log", 10 * 1024 * 1024))).await.unwrap();

    assert_eq!(report.original_mb(), 10.0);
    assert!(report.compressed_mb() <= 10.0);
    assert_eq!(bench.view().original_mb, Some(10.0));
}

#[tokio::test]
async fn test_heic_photo_is_converted_and_fits_target() {
    let jpeg = encode_image(&gradient_image(3000, 2000), ImageFormat::Jpeg);
    let converter = Arc::new(StubConverter(jpeg));
    let bench = Workbench::new(
        "image",
        ImageCompressor::with_converter(ImageOptions::default(), converter),
    );
    let photo = SelectedFile::from_bytes("photo.heic", vec![0u8; 3 * 1024 * 1024]);

    let report = bench.submit(Some(photo)).await.unwrap();

    assert_eq!(report.file_name, "photo.jpg");
    assert_eq!(report.mime, "image/jpeg");
    assert!(report.compressed_bytes <= 1024 * 1024);
    assert_eq!(bench.view().original_mb, Some(3.0));
}

#[tokio::test]
async fn test_heic_conversion_failure_leaves_no_result() {
    let bench = Workbench::new(
        "image",
        ImageCompressor::with_converter(ImageOptions::default(), Arc::new(BrokenConverter)),
    );
    let photo = SelectedFile::from_bytes("photo.heic", vec![1u8; 1024]);

    let result = bench.submit(Some(photo)).await;

    assert!(matches!(result, Err(LabError::FormatConversion(_))));
    let view = bench.view();
    assert_eq!(view.compressed_mb, None);
    assert_eq!(view.download, None);
    assert!(matches!(
        view.phase,
        Phase::Failed {
            kind: FailureKind::FormatConversion,
            ..
        }
    ));
    assert_eq!(bench.handles().live(), 0);
}

#[cfg(unix)]
fn sh_toolchain(script: &std::path::Path) -> Arc<Toolchain> {
    Arc::new(Toolchain::with_launcher(vec![
        OsString::from("sh"),
        script.as_os_str().to_os_string(),
    ]))
}

#[cfg(unix)]
#[tokio::test]
async fn test_video_phase_moves_through_processing_to_done() {
    let dir = TempDir::new().unwrap();
    let script = write_fake_ffmpeg(dir.path(), "sleep 0.3; head -c 4096 \"$2\" > \"$7\"");
    let toolchain = sh_toolchain(&script);
    let bench = Arc::new(Workbench::new(
        "video",
        VideoCompressor::new(VideoOptions::default(), Arc::clone(&toolchain)),
    ));
    assert_eq!(bench.phase(), Phase::Idle);

    let run = tokio::spawn({
        let bench = Arc::clone(&bench);
        async move {
            let clip = SelectedFile::from_bytes("clip.mov", vec![7u8; 50_000]);
            bench.submit(Some(clip)).await
        }
    });
    wait_until_busy(&bench).await;
    assert_eq!(bench.phase().to_string(), "in progress");

    let report = run.await.unwrap().unwrap();
    let view = bench.view();

    assert_eq!(view.phase, Phase::Done);
    assert_eq!(view.phase.to_string(), "done");
    assert_eq!(report.compressed_bytes, 4096);
    assert_eq!(report.file_name, "compressed_video.mp4");
    assert_eq!(report.mime, "video/mp4");
    assert!(report.elapsed >= Duration::from_millis(300));
    assert_eq!(view.elapsed, Some(report.elapsed));
    assert!(toolchain.is_loaded());
}

#[cfg(unix)]
#[tokio::test]
async fn test_video_toolchain_loaded_once_across_submissions() {
    let dir = TempDir::new().unwrap();
    let script = write_fake_ffmpeg(dir.path(), "cp \"$2\" \"$7\"");
    let toolchain = sh_toolchain(&script);
    let bench = Workbench::new(
        "video",
        VideoCompressor::new(VideoOptions::default(), Arc::clone(&toolchain)),
    );

    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        bench
            .submit(Some(SelectedFile::from_bytes(name, vec![1u8; 64])))
            .await
            .unwrap();
    }

    assert_eq!(toolchain.probe_count(), 1);
    assert_eq!(bench.handles().live(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_video_timeout_fails_workbench() {
    let dir = TempDir::new().unwrap();
    let script = write_fake_ffmpeg(dir.path(), "sleep 5");
    let options = VideoOptions::new(None, None, Some(Duration::from_millis(200))).unwrap();
    let bench = Workbench::new("video", VideoCompressor::new(options, sh_toolchain(&script)));

    let result = bench
        .submit(Some(SelectedFile::from_bytes("clip.mov", vec![0u8; 16])))
        .await;

    assert!(matches!(result, Err(LabError::Timeout(_))));
    assert!(bench.phase().is_failed());
    assert!(!bench.is_busy());
}

#[cfg(unix)]
#[tokio::test]
async fn test_video_timeout_covers_toolchain_load() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("hang.sh");
    std::fs::write(&script, "sleep 3\n").unwrap();
    let toolchain = sh_toolchain(&script);
    let options = VideoOptions::new(None, None, Some(Duration::from_millis(200))).unwrap();
    let bench = Workbench::new("video", VideoCompressor::new(options, Arc::clone(&toolchain)));

    let started = std::time::Instant::now();
    let result = bench
        .submit(Some(SelectedFile::from_bytes("clip.mov", vec![0u8; 16])))
        .await;

    assert!(matches!(result, Err(LabError::Timeout(_))));
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert!(matches!(
        bench.phase(),
        Phase::Failed {
            kind: FailureKind::Transcoder,
            ..
        }
    ));
    assert!(!toolchain.is_loaded());
    assert!(!bench.is_busy());
}
