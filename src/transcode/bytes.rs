use super::{Transcoded, Transcoder};
use crate::constants::{DEFAULT_BYTE_LEVEL, MAX_BYTE_LEVEL};
use crate::error::{LabError, Result};
use crate::selection::SelectedFile;
use flate2::write::ZlibEncoder;
use flate2::{Compression, GzBuilder};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteOptions {
    /// zlib level, 0 (store) to 9 (smallest).
    pub level: u8,
    /// Wrap the zlib stream in a gzip container carrying the file name.
    pub gzip_container: bool,
}

impl Default for ByteOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_BYTE_LEVEL,
            gzip_container: true,
        }
    }
}

impl ByteOptions {
    pub fn new(level: Option<u8>, gzip_container: bool) -> Result<Self> {
        let level = level.unwrap_or(DEFAULT_BYTE_LEVEL);
        if level > MAX_BYTE_LEVEL {
            return Err(LabError::InvalidLevel(level));
        }
        Ok(Self {
            level,
            gzip_container,
        })
    }
}

/// Generic in-memory compressor: zlib at a fixed level, optionally wrapped
/// in gzip so the archive remembers the original file name.
#[derive(Debug, Clone, Default)]
pub struct ByteCompressor {
    options: ByteOptions,
}

impl ByteCompressor {
    pub fn new(options: ByteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ByteOptions {
        &self.options
    }
}

impl Transcoder for ByteCompressor {
    fn label(&self) -> &'static str {
        if self.options.gzip_container {
            "zlib+gzip"
        } else {
            "zlib"
        }
    }

    fn transcode(&self, file: &SelectedFile) -> Result<Transcoded> {
        let zlib = zlib_compress(file.bytes(), self.options.level)?;
        if !self.options.gzip_container {
            return Ok(Transcoded {
                bytes: zlib,
                file_name: format!("{}.zz", file.name()),
                mime: "application/zlib".to_string(),
            });
        }

        let bytes = gzip_with_name(&zlib, file.name())?;
        Ok(Transcoded {
            bytes,
            file_name: file.name().to_string(),
            mime: "application/gzip".to_string(),
        })
    }
}

pub fn zlib_compress(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(u32::from(level)));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Gzip at the default level with `name` stored in the header.
pub fn gzip_with_name(data: &[u8], name: &str) -> Result<Vec<u8>> {
    // A NUL byte would terminate the header field early.
    let header_name: Vec<u8> = name.bytes().filter(|&b| b != 0).collect();
    let mut encoder = GzBuilder::new()
        .filename(header_name)
        .write(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
