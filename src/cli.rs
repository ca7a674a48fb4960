use clap::builder::ArgPredicate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "squeeze-lab",
    about = "Compare file, image, and video compression techniques",
    long_about = "squeeze-lab runs one file through a compression technique and reports the size \
                  before and after. Files go through zlib+gzip or a streaming codec, images are \
                  re-encoded towards a size and dimension target (HEIC is converted to JPEG first), \
                  and videos are re-encoded with ffmpeg.",
    version,
    after_help = "EXAMPLES:\n  \
    squeeze-lab file dump.sql -m zlib -l 9\n  \
    squeeze-lab file dump.sql -m stream -c deflate-raw\n  \
    squeeze-lab image photo.heic -o photo.jpg\n  \
    squeeze-lab video clip.mov --crf 30 -o small.mp4\n  \
    squeeze-lab compare dump.sql"
)]
pub struct Args {
    #[arg(short = 'q', long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Print encoder passes and toolchain logs"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileMethod {
    /// zlib at a fixed level, wrapped in gzip carrying the file name
    Zlib,
    /// Streaming encoder selected by codec name
    Stream,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress an arbitrary file",
        long_about = "Compress a file in memory. `zlib` compresses at the given level (default 9) and \
                      wraps the result in gzip with the original file name in its header. `stream` \
                      pipes the file through a streaming encoder (gzip, deflate, deflate-raw)."
    )]
    File {
        #[arg(help = "File to compress")]
        input: Option<PathBuf>,

        #[arg(
            short = 'm',
            long,
            value_enum,
            default_value_t = FileMethod::Zlib,
            default_value_if("codec", ArgPredicate::IsPresent, "stream"),
            help = "Compression method (default: zlib, or stream when --codec is given)"
        )]
        method: FileMethod,

        #[arg(
            short = 'l',
            long,
            conflicts_with = "codec",
            help = "zlib level 0-9 (default: 9)"
        )]
        level: Option<u8>,

        #[arg(
            short = 'c',
            long,
            help = "Streaming codec: gzip, deflate, deflate-raw (default: gzip)"
        )]
        codec: Option<String>,

        #[arg(short = 'o', long, help = "Save the compressed result here")]
        output: Option<PathBuf>,
    },

    #[command(
        about = "Re-encode an image towards a size and dimension target",
        long_about = "Re-encode an image so it fits within --max-dimension on both sides and, where \
                      possible, under --max-size-mb. HEIC input is converted to JPEG first with \
                      heif-convert; if that conversion fails nothing is re-encoded."
    )]
    Image {
        #[arg(help = "Image to compress")]
        input: Option<PathBuf>,

        #[arg(long, help = "Target maximum size in MB (default: 1)")]
        max_size_mb: Option<f64>,

        #[arg(long, help = "Maximum width or height in pixels (default: 1920)")]
        max_dimension: Option<u32>,

        #[arg(long, help = "HEIC converter program (default: heif-convert)")]
        heif_convert: Option<PathBuf>,

        #[arg(short = 'o', long, help = "Save the compressed image here")]
        output: Option<PathBuf>,
    },

    #[command(
        about = "Re-encode a video with ffmpeg",
        long_about = "Re-encode a video with ffmpeg using a fixed codec and constant rate factor. \
                      The input is copied into a scratch directory, ffmpeg writes \
                      compressed_video.mp4 there, and the result is read back."
    )]
    Video {
        #[arg(help = "Video to compress")]
        input: Option<PathBuf>,

        #[arg(long, help = "Video codec passed to -vcodec (default: libx264)")]
        codec: Option<String>,

        #[arg(long, help = "Constant rate factor 0-51 (default: 28)")]
        crf: Option<u8>,

        #[arg(long, help = "ffmpeg program (default: ffmpeg)")]
        ffmpeg: Option<String>,

        #[arg(
            long = "ffmpeg-arg",
            allow_hyphen_values = true,
            help = "Extra leading argument for the ffmpeg program (repeatable)",
            long_help = "Arguments placed between the ffmpeg program and ffmpeg's own arguments, \
                         for launching ffmpeg through a wrapper such as `sh wrapper.sh`."
        )]
        ffmpeg_args: Vec<String>,

        #[arg(long, help = "Give up after this many seconds")]
        timeout: Option<u64>,

        #[arg(short = 'o', long, help = "Save the compressed video here")]
        output: Option<PathBuf>,
    },

    #[command(
        about = "Run every file technique on one file and compare",
        long_about = "Compress the same file with zlib+gzip and with every streaming codec in \
                      parallel, then print one row per technique."
    )]
    Compare {
        #[arg(help = "File to compress")]
        input: PathBuf,

        #[arg(short = 'l', long, help = "zlib level 0-9 (default: 9)")]
        level: Option<u8>,
    },

    #[command(about = "Show how a file would be picked up")]
    Info {
        #[arg(help = "File to inspect")]
        input: PathBuf,
    },
}
