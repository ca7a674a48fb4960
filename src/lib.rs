pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod handle;
pub mod logger;
pub mod report;
pub mod selection;
pub mod transcode;
pub mod workbench;

pub use error::{FailureKind, LabError, Result};
pub use handle::{DownloadHandle, HandleTracker};
pub use report::{size_mb, TranscodeReport};
pub use selection::SelectedFile;
pub use transcode::{
    ByteCompressor, ByteOptions, CommandHeicConverter, HeicConverter, ImageCompressor,
    ImageOptions, StreamCodec, StreamCompressor, Toolchain, Transcoded, Transcoder,
    VideoCompressor, VideoOptions,
};
pub use workbench::{Phase, Workbench, WorkbenchView};
