#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// Repetitive text of exactly `len` bytes.
pub fn compressible_bytes(len: usize) -> Vec<u8> {
    let line = b"2024-05-01T12:00:00Z INFO request served in 12ms\n";
    line.iter().copied().cycle().take(len).collect()
}

pub fn write_text_file(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, compressible_bytes(len)).unwrap();
    path
}

pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

pub fn encode_image(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn write_image(dir: &Path, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, encode_image(&gradient_image(width, height), format)).unwrap();
    path
}

/// Writes a shell script standing in for ffmpeg. It answers the version
/// probe and otherwise runs `body`, where `$2` is the input and `$7` the
/// output name. Run it as `sh <script>`.
pub fn write_fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("fake-ffmpeg.sh");
    let content = format!(
        "if [ \"$1\" = \"-version\" ]; then echo 'ffmpeg version 0.0-fake'; exit 0; fi\n{}\n",
        body
    );
    fs::write(&script, content).unwrap();
    script
}
