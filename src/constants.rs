pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// Byte compressor (zlib stage; the gzip wrapper always uses the default level)
pub const DEFAULT_BYTE_LEVEL: u8 = 9;
pub const MAX_BYTE_LEVEL: u8 = 9;

// Image workbench
pub const DEFAULT_MAX_SIZE_MB: f64 = 1.0;
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;
pub const INITIAL_JPEG_QUALITY: u8 = 90;
pub const MIN_JPEG_QUALITY: u8 = 1;
pub const SHRINK_FACTOR: f64 = 0.95;
pub const MAX_ENCODE_ITERATIONS: u32 = 10;
pub const PNG_OXIPNG_PRESET: u8 = 2;
pub const DEFAULT_HEIF_CONVERT: &str = "heif-convert";

// Video workbench
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const DEFAULT_CRF: u8 = 28;
pub const MAX_CRF: u8 = 51;
pub const VIDEO_OUTPUT_NAME: &str = "compressed_video.mp4";
pub const VIDEO_MIME: &str = "video/mp4";
pub const TOOLCHAIN_LOG_NAME: &str = "toolchain.log";
pub const TOOLCHAIN_LOG_TAIL_LINES: usize = 12;

pub const DOWNLOAD_PREFIX: &str = "squeeze-lab-";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Before:";
pub const COMPRESSED_SIZE_PREFIX: &str = "📈 After:";
pub const COMPRESSION_RATIO_PREFIX: &str = "🎯 Compression ratio:";
pub const ELAPSED_PREFIX: &str = "⏱️  Processing time:";
pub const STATUS_PREFIX: &str = "🔄 Status:";
pub const DOWNLOAD_PREFIX_MSG: &str = "💾 Download:";
pub const INFO_PREFIX: &str = "📋";

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Avif,
    Heic,
    Mp4,
    QuickTime,
    WebM,
    Matroska,
    Gzip,
    Text,
}

impl MediaKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaKind::Jpeg),
            "png" => Some(MediaKind::Png),
            "webp" => Some(MediaKind::WebP),
            "gif" => Some(MediaKind::Gif),
            "bmp" => Some(MediaKind::Bmp),
            "tif" | "tiff" => Some(MediaKind::Tiff),
            "avif" => Some(MediaKind::Avif),
            "heic" | "heif" => Some(MediaKind::Heic),
            "mp4" | "m4v" => Some(MediaKind::Mp4),
            "mov" => Some(MediaKind::QuickTime),
            "webm" => Some(MediaKind::WebM),
            "mkv" => Some(MediaKind::Matroska),
            "gz" => Some(MediaKind::Gzip),
            "txt" | "md" | "csv" | "log" => Some(MediaKind::Text),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Png => "image/png",
            MediaKind::WebP => "image/webp",
            MediaKind::Gif => "image/gif",
            MediaKind::Bmp => "image/bmp",
            MediaKind::Tiff => "image/tiff",
            MediaKind::Avif => "image/avif",
            MediaKind::Heic => "image/heic",
            MediaKind::Mp4 => "video/mp4",
            MediaKind::QuickTime => "video/quicktime",
            MediaKind::WebM => "video/webm",
            MediaKind::Matroska => "video/x-matroska",
            MediaKind::Gzip => "application/gzip",
            MediaKind::Text => "text/plain",
        }
    }
}
