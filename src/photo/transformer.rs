//! Photo transformer.
//!
//! Decodes a stored photo, applies its rotation and the size transform, and
//! re-encodes the result as JPEG.
//!
//! # Rotation
//!
//! Rotations are counter-clockwise in degrees and always expand the canvas so
//! no content is clipped. Right angles are exact pixel permutations; any other
//! angle is resampled with nearest-neighbor and the uncovered corners are black.
//!
//! The two transform kinds rotate in opposite directions relative to the
//! stored `rotation` value:
//!
//! - [`TransformSpec::ReductionFactor`] rotates by `rotation`.
//! - [`TransformSpec::BoundingBox`] rotates by `-rotation`.
//!
//! # Bounding box fit
//!
//! The target size is computed from the *pre-rotation* dimensions, swapped when
//! the rotation is a quarter turn. There is no upscaling guard: a box larger
//! than the photo enlarges it.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, ImageReader, Pixel};

use super::catalog::TransformSpec;
use crate::error::PhotoError;

/// Default JPEG quality for encoded output.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Filter used for bounding box resizes.
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

// =============================================================================
// Transformer
// =============================================================================

/// Applies rotation and size transforms to raw photo bytes.
///
/// Stateless apart from the output quality, so it is cheap to clone into
/// blocking tasks.
#[derive(Debug, Clone, Copy)]
pub struct PhotoTransformer {
    quality: u8,
}

impl PhotoTransformer {
    /// Create a transformer that encodes at [`DEFAULT_JPEG_QUALITY`].
    pub fn new() -> Self {
        Self::with_quality(DEFAULT_JPEG_QUALITY)
    }

    /// Create a transformer with a specific JPEG quality (clamped to 1-100).
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY),
        }
    }

    /// The JPEG quality used for output.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Transform raw photo bytes.
    ///
    /// # Arguments
    ///
    /// * `source` - Stored photo bytes
    /// * `rotation` - Rotation recorded for the photo, in degrees
    /// * `spec` - Size transform from the catalog
    ///
    /// [`TransformSpec::Identity`] returns `source` unchanged without decoding
    /// it, and without applying `rotation`.
    ///
    /// # Errors
    ///
    /// - [`PhotoError::DecodeFailure`] if `source` is not a decodable image
    /// - [`PhotoError::EmptyOutput`] if the target size has a zero dimension
    /// - [`PhotoError::EncodeFailure`] if JPEG encoding fails
    pub fn apply(
        &self,
        source: &[u8],
        rotation: i32,
        spec: TransformSpec,
    ) -> Result<Bytes, PhotoError> {
        if spec.is_identity() {
            return Ok(Bytes::copy_from_slice(source));
        }

        let img = decode(source)?;
        let transformed = transform_image(&img, rotation, spec)?;
        self.encode(&transformed)
    }

    /// Encode an image as JPEG at this transformer's quality.
    pub fn encode(&self, img: &DynamicImage) -> Result<Bytes, PhotoError> {
        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.quality);

        // JPEG has no alpha channel; keep grayscale, flatten everything else to RGB.
        let result = match img {
            DynamicImage::ImageLuma8(buf) => encoder.encode_image(buf),
            DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) => {
                encoder.encode_image(&img.to_luma8())
            }
            _ => encoder.encode_image(&img.to_rgb8()),
        };

        result.map_err(|e| PhotoError::EncodeFailure {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(output))
    }
}

impl Default for PhotoTransformer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Pipeline Steps
// =============================================================================

/// Decode raw bytes, detecting the format from its magic bytes.
pub fn decode(source: &[u8]) -> Result<DynamicImage, PhotoError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| PhotoError::DecodeFailure {
            message: e.to_string(),
        })?;

    reader.decode().map_err(|e| PhotoError::DecodeFailure {
        message: e.to_string(),
    })
}

/// Apply rotation and the size transform to a decoded image.
pub fn transform_image(
    img: &DynamicImage,
    rotation: i32,
    spec: TransformSpec,
) -> Result<DynamicImage, PhotoError> {
    let work_rotation = rotation.wrapping_neg();

    match spec {
        TransformSpec::Identity => Ok(img.clone()),

        TransformSpec::ReductionFactor(factor) => {
            let rotated = rotate_expand(img, work_rotation.wrapping_neg());
            reduce(&rotated, factor)
        }

        TransformSpec::BoundingBox { width, height } => {
            let (target_width, target_height) =
                fit_dimensions(img.width(), img.height(), work_rotation, width, height);

            if target_width == 0 || target_height == 0 {
                return Err(PhotoError::EmptyOutput {
                    width: target_width,
                    height: target_height,
                });
            }

            let rotated = rotate_expand(img, work_rotation);
            Ok(rotated.resize_exact(target_width, target_height, RESIZE_FILTER))
        }
    }
}

/// Whether a rotation (in degrees, any sign) is a quarter turn.
#[inline]
pub fn swaps_axes(degrees: i32) -> bool {
    matches!(degrees.rem_euclid(360), 90 | 270)
}

/// Compute the bounding box target size for an image.
///
/// `width` and `height` are the dimensions *before* rotation; they are swapped
/// when `rotation` is a quarter turn. The larger of the two axis ratios wins,
/// and both results are truncated toward zero.
pub fn fit_dimensions(
    width: u32,
    height: u32,
    rotation: i32,
    box_width: u32,
    box_height: u32,
) -> (u32, u32) {
    let (rotated_width, rotated_height) = if swaps_axes(rotation) {
        (height, width)
    } else {
        (width, height)
    };

    let ratio_width = rotated_width as f64 / box_width as f64;
    let ratio_height = rotated_height as f64 / box_height as f64;
    let ratio = ratio_width.max(ratio_height);

    (
        (rotated_width as f64 / ratio) as u32,
        (rotated_height as f64 / ratio) as u32,
    )
}

// =============================================================================
// Rotation
// =============================================================================

/// Rotate counter-clockwise by `degrees`, expanding the canvas to fit.
pub fn rotate_expand(img: &DynamicImage, degrees: i32) -> DynamicImage {
    match degrees.rem_euclid(360) {
        0 => img.clone(),
        // imageops rotations are clockwise
        90 => img.rotate270(),
        180 => img.rotate180(),
        270 => img.rotate90(),
        _ => {
            let degrees = degrees as f64;
            match img {
                DynamicImage::ImageLuma8(buf) => {
                    DynamicImage::ImageLuma8(rotate_nearest(buf, degrees))
                }
                DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(rotate_nearest(buf, degrees)),
                other => DynamicImage::ImageRgba8(rotate_nearest(&other.to_rgba8(), degrees)),
            }
        }
    }
}

/// Canvas size that holds a `width x height` image rotated by `degrees`.
pub fn expanded_dimensions(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let half_w = width as f64 / 2.0;
    let half_h = height as f64 / 2.0;

    let corners = [(-half_w, -half_h), (half_w, -half_h), (half_w, half_h), (-half_w, half_h)];

    let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
    let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
    for (x, y) in corners {
        let rx = x * cos + y * sin;
        let ry = -x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    (
        (max_x.ceil() - min_x.floor()) as u32,
        (max_y.ceil() - min_y.floor()) as u32,
    )
}

/// Nearest-neighbor rotation by inverse mapping each output pixel.
fn rotate_nearest<P>(src: &ImageBuffer<P, Vec<P::Subpixel>>, degrees: f64) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
{
    let (width, height) = src.dimensions();
    let (new_width, new_height) = expanded_dimensions(width, height, degrees);
    let mut out = ImageBuffer::new(new_width, new_height);

    let (sin, cos) = degrees.to_radians().sin_cos();
    let src_cx = width as f64 / 2.0;
    let src_cy = height as f64 / 2.0;
    let dst_cx = new_width as f64 / 2.0;
    let dst_cy = new_height as f64 / 2.0;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - dst_cx;
        let dy = y as f64 + 0.5 - dst_cy;

        let sx = (dx * cos - dy * sin + src_cx).floor();
        let sy = (dx * sin + dy * cos + src_cy).floor();

        if sx >= 0.0 && sy >= 0.0 && sx < width as f64 && sy < height as f64 {
            *pixel = *src.get_pixel(sx as u32, sy as u32);
        }
    }

    out
}

// =============================================================================
// Reduction
// =============================================================================

/// Downsample by an integer factor, averaging each `factor x factor` block.
///
/// Output is `floor(width / factor) x floor(height / factor)`; trailing rows and
/// columns that do not fill a whole block are dropped.
pub fn reduce(img: &DynamicImage, factor: u32) -> Result<DynamicImage, PhotoError> {
    let factor = factor.max(1);
    if factor == 1 {
        return Ok(img.clone());
    }

    let width = img.width() / factor;
    let height = img.height() / factor;
    if width == 0 || height == 0 {
        return Err(PhotoError::EmptyOutput { width, height });
    }

    let reduced = match img {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(block_average(buf, factor)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(block_average(buf, factor)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(block_average(buf, factor)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(block_average(buf, factor)),
        other => DynamicImage::ImageRgba8(block_average(&other.to_rgba8(), factor)),
    };

    Ok(reduced)
}

fn block_average<P>(src: &ImageBuffer<P, Vec<u8>>, factor: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let channels = P::CHANNEL_COUNT as usize;
    let width = src.width() / factor;
    let height = src.height() / factor;
    let area = factor * factor;

    let mut out = ImageBuffer::new(width, height);
    let mut sums = [0u32; 4];
    let mut averaged = [0u8; 4];

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        sums[..channels].fill(0);

        for by in 0..factor {
            for bx in 0..factor {
                let p = src.get_pixel(x * factor + bx, y * factor + by);
                for (sum, value) in sums.iter_mut().zip(p.channels()) {
                    *sum += *value as u32;
                }
            }
        }

        for c in 0..channels {
            averaged[c] = ((sums[c] + area / 2) / area) as u8;
        }
        *pixel = *P::from_slice(&averaged[..channels]);
    }

    out
}

// =============================================================================
// Tests
// =============================================================================
