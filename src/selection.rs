//! File intake: the bytes, name and MIME type of the file a user picked.

use crate::constants::{MediaKind, OCTET_STREAM_MIME};
use crate::error::{LabError, Result};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl SelectedFile {
    /// Builds a selection from in-memory bytes, guessing the MIME type from
    /// the name and, for images, from the content.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name, &bytes).to_string();
        Self { name, mime, bytes }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Reads the whole file into memory. A missing path or anything that is
    /// not a regular file is reported as [`LabError::FileNotFound`].
    pub async fn from_path(path: &Path) -> Result<Self> {
        let not_found = || LabError::FileNotFound(path.to_path_buf());
        let metadata = fs::metadata(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(),
            _ => LabError::Io(e),
        })?;
        if !metadata.is_file() {
            return Err(not_found());
        }
        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True when the file should go through HEIC conversion first: either
    /// the MIME type says so or the name ends in `.heic`.
    pub fn is_heic(&self) -> bool {
        let mime = self.mime.to_ascii_lowercase();
        mime == "image/heic" || mime == "image/heif" || self.name.to_ascii_lowercase().ends_with(".heic")
    }
}

fn guess_mime(name: &str, bytes: &[u8]) -> &'static str {
    let by_extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(MediaKind::from_extension);
    if let Some(kind) = by_extension {
        return kind.mime_type();
    }
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => OCTET_STREAM_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mime_from_extension() {
        let file = SelectedFile::from_bytes("clip.MOV", vec![0; 4]);
        assert_eq!(file.mime(), "video/quicktime");

        let file = SelectedFile::from_bytes("notes.txt", b"hello".to_vec());
        assert_eq!(file.mime(), "text/plain");
    }

    #[test]
    fn test_mime_sniffed_from_content() {
        let png_magic = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let file = SelectedFile::from_bytes("upload", png_magic);
        assert_eq!(file.mime(), "image/png");

        let file = SelectedFile::from_bytes("blob.bin", vec![1, 2, 3]);
        assert_eq!(file.mime(), OCTET_STREAM_MIME);
    }

    #[test]
    fn test_is_heic() {
        assert!(SelectedFile::from_bytes("photo.heic", vec![]).is_heic());
        assert!(SelectedFile::from_bytes("PHOTO.HEIC", vec![]).is_heic());
        assert!(SelectedFile::from_bytes("blob", vec![])
            .with_mime("image/heic")
            .is_heic());
        assert!(!SelectedFile::from_bytes("photo.jpg", vec![]).is_heic());
    }

    #[tokio::test]
    async fn test_from_path_reads_everything() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&[7u8; 2048]).unwrap();

        let file = SelectedFile::from_path(tmp.path()).await.unwrap();
        assert_eq!(file.size(), 2048);
        assert_eq!(file.bytes()[0], 7);
    }

    #[tokio::test]
    async fn test_from_path_not_found() {
        let result = SelectedFile::from_path(Path::new("nonexistent.bin")).await;
        assert!(matches!(result, Err(LabError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_from_path_directory_is_missing_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let error = SelectedFile::from_path(dir.path()).await.unwrap_err();

        assert!(matches!(error, LabError::FileNotFound(_)));
        assert_eq!(error.kind(), crate::error::FailureKind::UserInputMissing);
    }
}
