use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Luma, imageops};
use tracing::debug;

use crate::config::VectorizeOptions;
use crate::{VectorizeError, VectorizeResult};

/// Single-channel brightness samples on the working grid, 0 = black.
#[derive(Debug, Clone)]
pub struct LuminanceGrid {
    samples: GrayImage,
}

impl LuminanceGrid {
    /// Wrap an existing grayscale buffer.
    pub fn from_gray(samples: GrayImage) -> VectorizeResult<Self> {
        let (width, height) = samples.dimensions();
        if width == 0 || height == 0 {
            return Err(VectorizeError::EmptyImage { width, height });
        }
        Ok(Self { samples })
    }

    pub fn width(&self) -> u32 {
        self.samples.width()
    }

    pub fn height(&self) -> u32 {
        self.samples.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn sample(&self, x: u32, y: u32) -> u8 {
        self.samples.get_pixel(x, y)[0]
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.samples
    }
}

/// Rec. 601 luma, rounded.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}

/// Working grid size for an input of `width` x `height`: the longer edge is
/// capped at `max_edge`, aspect ratio preserved, never upscaled.
pub fn working_size(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max_edge {
        return (width, height);
    }
    let scale = max_edge as f64 / long as f64;
    let fit = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max_edge);
    if width >= height {
        (max_edge, fit(height))
    } else {
        (fit(width), max_edge)
    }
}

/// Reject zero-size and oversized inputs before any pixel work.
pub fn check_dimensions(width: u32, height: u32, options: &VectorizeOptions) -> VectorizeResult<()> {
    if width == 0 || height == 0 {
        return Err(VectorizeError::EmptyImage { width, height });
    }
    let pixels = width as u64 * height as u64;
    if pixels > options.max_input_pixels {
        return Err(VectorizeError::ResourceLimit {
            what: "input pixels",
            limit: options.max_input_pixels,
            found: pixels,
        });
    }
    Ok(())
}

/// Reject an encoded input longer than `max_input_bytes`.
pub fn check_byte_len(len: u64, options: &VectorizeOptions) -> VectorizeResult<()> {
    if len > options.max_input_bytes {
        return Err(VectorizeError::ResourceLimit {
            what: "input bytes",
            limit: options.max_input_bytes,
            found: len,
        });
    }
    Ok(())
}

/// Decode PNG or JPEG bytes. Size limits are checked against the header
/// before the pixel data is decoded.
pub fn decode_image(bytes: &[u8], options: &VectorizeOptions) -> VectorizeResult<DynamicImage> {
    check_byte_len(bytes.len() as u64, options)?;

    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = match reader.format() {
        Some(format @ (ImageFormat::Png | ImageFormat::Jpeg)) => format,
        Some(other) => {
            return Err(VectorizeError::UnsupportedFormat(format!("{other:?}")));
        }
        None => {
            return Err(VectorizeError::UnsupportedFormat(
                "unrecognized image signature".to_string(),
            ));
        }
    };

    let (width, height) = reader.into_dimensions()?;
    check_dimensions(width, height, options)?;

    let image = ImageReader::with_format(Cursor::new(bytes), format).decode()?;
    debug!(?format, width, height, "decoded input image");
    Ok(image)
}

/// Convert a decoded image into the working luminance grid.
///
/// Pixels whose alpha is below `options.alpha_cutoff` become background
/// (255) before resampling, so transparent areas never trace as dark shapes.
pub fn normalize(image: &DynamicImage, options: &VectorizeOptions) -> VectorizeResult<LuminanceGrid> {
    let (width, height) = (image.width(), image.height());
    check_dimensions(width, height, options)?;

    let rgba = image.to_rgba8();
    let cutoff = options.alpha_cutoff;
    let mut gray = GrayImage::new(width, height);
    for (src, dst) in rgba.pixels().zip(gray.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let value = if a < cutoff { 255 } else { luminance(r, g, b) };
        *dst = Luma([value]);
    }

    let (target_w, target_h) = working_size(width, height, options.max_working_edge);
    let samples = if (target_w, target_h) == (width, height) {
        gray
    } else {
        imageops::resize(&gray, target_w, target_h, options.resize_filter)
    };
    debug!(
        source_width = width,
        source_height = height,
        working_width = target_w,
        working_height = target_h,
        "normalized luminance grid"
    );

    LuminanceGrid::from_gray(samples)
}

/// Decode and normalize in one step.
pub fn load_luminance(bytes: &[u8], options: &VectorizeOptions) -> VectorizeResult<LuminanceGrid> {
    let image = decode_image(bytes, options)?;
    normalize(&image, options)
}
