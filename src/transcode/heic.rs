use crate::constants::DEFAULT_HEIF_CONVERT;
use crate::error::{LabError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Converts a HEIC/HEIF blob into JPEG bytes.
pub trait HeicConverter: Send + Sync {
    fn to_jpeg(&self, heic: &[u8]) -> Result<Vec<u8>>;
}

/// Shells out to libheif's `heif-convert`, which must be on `PATH` unless an
/// explicit program path is given.
#[derive(Debug, Clone)]
pub struct CommandHeicConverter {
    program: PathBuf,
}

impl Default for CommandHeicConverter {
    fn default() -> Self {
        Self::new(DEFAULT_HEIF_CONVERT)
    }
}

impl CommandHeicConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl HeicConverter for CommandHeicConverter {
    fn to_jpeg(&self, heic: &[u8]) -> Result<Vec<u8>> {
        let scratch = TempDir::new()?;
        let input = scratch.path().join("input.heic");
        let output = scratch.path().join("output.jpg");
        fs::write(&input, heic)?;

        let result = Command::new(&self.program)
            .arg(&input)
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                LabError::FormatConversion(format!(
                    "could not run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(LabError::FormatConversion(format!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                stderr.trim()
            )));
        }

        fs::read(&output).map_err(|e| {
            LabError::FormatConversion(format!("converter produced no output: {}", e))
        })
    }
}
