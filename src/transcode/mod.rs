//! Interchangeable transcoders.
//!
//! Every transcoder takes the whole selected file and returns the whole
//! result. Most implementations are blocking and run on the blocking pool;
//! the video transcoder drives its child process on the runtime instead.

pub mod bytes;
pub mod heic;
pub mod raster;
pub mod stream;
pub mod video;

use crate::error::{LabError, Result};
use crate::selection::SelectedFile;
use async_trait::async_trait;
use std::sync::Arc;

pub use self::bytes::{ByteCompressor, ByteOptions};
pub use self::heic::{CommandHeicConverter, HeicConverter};
pub use self::raster::{ImageCompressor, ImageOptions};
pub use self::stream::{StreamCodec, StreamCompressor};
pub use self::video::{Toolchain, VideoCompressor, VideoOptions};

/// The output of a transcoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

#[async_trait]
pub trait Transcoder: Send + Sync + 'static {
    /// Short human-readable name, e.g. `"zlib+gzip"`.
    fn label(&self) -> &'static str;

    fn transcode(&self, file: &SelectedFile) -> Result<Transcoded>;

    /// Entry point used by the workbench. The default runs
    /// [`transcode`](Self::transcode) on the blocking pool.
    async fn transcode_async(self: Arc<Self>, file: SelectedFile) -> Result<Transcoded> {
        tokio::task::spawn_blocking(move || self.transcode(&file))
            .await
            .map_err(|e| LabError::TaskJoin(e.to_string()))?
    }
}
