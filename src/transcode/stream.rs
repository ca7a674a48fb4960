use super::{Transcoded, Transcoder};
use crate::error::{LabError, Result};
use crate::selection::SelectedFile;
use flate2::read::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

/// Codec identifiers accepted by the streaming compressor. The names follow
/// the well-known `CompressionStream` formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamCodec {
    #[default]
    Gzip,
    /// zlib-wrapped deflate
    Deflate,
    DeflateRaw,
}

impl StreamCodec {
    pub fn all() -> [StreamCodec; 3] {
        [StreamCodec::Gzip, StreamCodec::Deflate, StreamCodec::DeflateRaw]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            StreamCodec::Gzip => "gz",
            StreamCodec::Deflate => "zz",
            StreamCodec::DeflateRaw => "deflate",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            StreamCodec::Gzip => "application/gzip",
            StreamCodec::Deflate => "application/zlib",
            StreamCodec::DeflateRaw => "application/octet-stream",
        }
    }

    /// Wraps `source` in the matching streaming encoder.
    fn encoder<'a, R: Read + 'a>(&self, source: R) -> Box<dyn Read + 'a> {
        let level = Compression::default();
        match self {
            StreamCodec::Gzip => Box::new(GzEncoder::new(source, level)),
            StreamCodec::Deflate => Box::new(ZlibEncoder::new(source, level)),
            StreamCodec::DeflateRaw => Box::new(DeflateEncoder::new(source, level)),
        }
    }
}

impl fmt::Display for StreamCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamCodec::Gzip => "gzip",
            StreamCodec::Deflate => "deflate",
            StreamCodec::DeflateRaw => "deflate-raw",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for StreamCodec {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gzip" => Ok(StreamCodec::Gzip),
            "deflate" => Ok(StreamCodec::Deflate),
            "deflate-raw" => Ok(StreamCodec::DeflateRaw),
            other => Err(LabError::UnsupportedCodec(other.to_string())),
        }
    }
}

/// Pipes the file through a streaming encoder and collects the whole output
/// before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamCompressor {
    codec: StreamCodec,
}

impl StreamCompressor {
    pub fn new(codec: StreamCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> StreamCodec {
        self.codec
    }
}

impl Transcoder for StreamCompressor {
    fn label(&self) -> &'static str {
        match self.codec {
            StreamCodec::Gzip => "stream:gzip",
            StreamCodec::Deflate => "stream:deflate",
            StreamCodec::DeflateRaw => "stream:deflate-raw",
        }
    }

    fn transcode(&self, file: &SelectedFile) -> Result<Transcoded> {
        let mut encoder = self.codec.encoder(file.bytes());
        let mut bytes = Vec::new();
        io::copy(&mut encoder, &mut bytes)?;

        Ok(Transcoded {
            bytes,
            file_name: format!("{}.{}", file.name(), self.codec.extension()),
            mime: self.codec.mime_type().to_string(),
        })
    }
}
