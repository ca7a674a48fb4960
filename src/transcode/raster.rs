use super::heic::{CommandHeicConverter, HeicConverter};
use super::{Transcoded, Transcoder};
use crate::constants::{
    BYTES_PER_MB, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_SIZE_MB, INITIAL_JPEG_QUALITY,
    MAX_ENCODE_ITERATIONS, MIN_JPEG_QUALITY, PNG_OXIPNG_PRESET, SHRINK_FACTOR,
};
use crate::error::{LabError, Result};
use crate::selection::SelectedFile;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageOptions {
    pub max_size_bytes: u64,
    pub max_dimension: u32,
    pub initial_quality: u8,
    pub max_iterations: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: (DEFAULT_MAX_SIZE_MB * BYTES_PER_MB) as u64,
            max_dimension: DEFAULT_MAX_DIMENSION,
            initial_quality: INITIAL_JPEG_QUALITY,
            max_iterations: MAX_ENCODE_ITERATIONS,
        }
    }
}

impl ImageOptions {
    pub fn new(max_size_mb: Option<f64>, max_dimension: Option<u32>) -> Result<Self> {
        let max_size_mb = max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB);
        if !max_size_mb.is_finite() || max_size_mb <= 0.0 {
            return Err(LabError::InvalidImageTarget(format!(
                "max size must be a positive number of MB, got {}",
                max_size_mb
            )));
        }
        let max_dimension = max_dimension.unwrap_or(DEFAULT_MAX_DIMENSION);
        if max_dimension == 0 {
            return Err(LabError::InvalidImageTarget(
                "max dimension must be at least 1 pixel".to_string(),
            ));
        }

        Ok(Self {
            max_size_bytes: ((max_size_mb * BYTES_PER_MB) as u64).max(1),
            max_dimension,
            ..Self::default()
        })
    }
}

/// Size-targeting raster re-encoder. HEIC input is converted to JPEG first;
/// if that conversion fails the whole operation fails.
pub struct ImageCompressor {
    options: ImageOptions,
    converter: Arc<dyn HeicConverter>,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self::new(ImageOptions::default())
    }
}

impl ImageCompressor {
    pub fn new(options: ImageOptions) -> Self {
        Self::with_converter(options, Arc::new(CommandHeicConverter::default()))
    }

    pub fn with_converter(options: ImageOptions, converter: Arc<dyn HeicConverter>) -> Self {
        Self { options, converter }
    }

    pub fn options(&self) -> &ImageOptions {
        &self.options
    }
}

impl Transcoder for ImageCompressor {
    fn label(&self) -> &'static str {
        "raster"
    }

    fn transcode(&self, file: &SelectedFile) -> Result<Transcoded> {
        let (source, name, mime): (Cow<'_, [u8]>, String, String) = if file.is_heic() {
            let jpeg = self.converter.to_jpeg(file.bytes())?;
            crate::verbose!("Converted HEIC {} to JPEG ({} bytes)", file.name(), jpeg.len());
            (
                Cow::Owned(jpeg),
                replace_extension(file.name(), "jpg"),
                "image/jpeg".to_string(),
            )
        } else {
            (
                Cow::Borrowed(file.bytes()),
                file.name().to_string(),
                file.mime().to_string(),
            )
        };

        let source_format = image::guess_format(&source)?;
        let img = image::load_from_memory_with_format(&source, source_format)?;
        let (width, height) = img.dimensions();

        let max_dim = self.options.max_dimension;
        if source.len() as u64 <= self.options.max_size_bytes && width <= max_dim && height <= max_dim {
            crate::verbose!("{} already within limits, keeping original bytes", name);
            return Ok(Transcoded {
                bytes: source.into_owned(),
                file_name: name,
                mime,
            });
        }

        let target = output_format(source_format);
        let bytes = shrink_to_target(&img, target, &self.options)?;
        let file_name = if target == source_format {
            name
        } else {
            replace_extension(&name, target.extensions_str()[0])
        };

        Ok(Transcoded {
            bytes,
            file_name,
            mime: target.to_mime_type().to_string(),
        })
    }
}

/// PNG stays PNG; everything else is re-encoded as JPEG.
pub fn output_format(source: ImageFormat) -> ImageFormat {
    match source {
        ImageFormat::Png => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    }
}

/// Scales `img` down so neither side exceeds `max_dimension`, keeping the
/// aspect ratio. Smaller images are returned as-is.
pub fn fit_within(img: &DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width() <= max_dimension && img.height() <= max_dimension {
        return img.clone();
    }
    img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

/// Encodes `img`, then keeps lowering quality and scale by `SHRINK_FACTOR`
/// until the output fits `max_size_bytes` or the iteration budget runs out.
/// Returns the smallest encoding seen.
pub fn shrink_to_target(
    img: &DynamicImage,
    format: ImageFormat,
    options: &ImageOptions,
) -> Result<Vec<u8>> {
    let mut current = fit_within(img, options.max_dimension);
    let mut quality = options.initial_quality;
    let mut best = encode(&current, format, quality)?;
    let mut iterations = 1;

    while best.len() as u64 > options.max_size_bytes && iterations < options.max_iterations {
        quality = ((f64::from(quality) * SHRINK_FACTOR).round() as u8).max(MIN_JPEG_QUALITY);
        let width = ((f64::from(current.width()) * SHRINK_FACTOR) as u32).max(1);
        let height = ((f64::from(current.height()) * SHRINK_FACTOR) as u32).max(1);
        current = current.resize_exact(width, height, FilterType::Lanczos3);

        let candidate = encode(&current, format, quality)?;
        crate::verbose!(
            "Pass {}: {}x{} q{} -> {} bytes",
            iterations + 1,
            width,
            height,
            quality,
            candidate.len()
        );
        if candidate.len() < best.len() {
            best = candidate;
        }
        iterations += 1;
    }

    Ok(best)
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
            Ok(buf)
        }
        ImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
            let options = oxipng::Options::from_preset(PNG_OXIPNG_PRESET);
            oxipng::optimize_from_memory(&buf, &options)
                .map_err(|e| LabError::PngOptimization(e.to_string()))
        }
        other => Err(LabError::UnsupportedFormat(format!("{:?}", other))),
    }
}

fn replace_extension(name: &str, extension: &str) -> String {
    Path::new(name)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}
