use std::io::Cursor;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::FilterType;

use crate::config::PipelineConfig;
use crate::error::{PortraitError, PortraitResult};

/// Lowest quality the payload-ceiling back-off will accept. Configured
/// qualities below this are rejected at validation time.
pub const QUALITY_FLOOR: f32 = 0.4;
const QUALITY_STEP: f32 = 0.1;

const DATA_URI_JPEG_PREFIX: &str = "data:image/jpeg;base64,";

/// Encoding parameters for [`normalize`]. Derived from the session config so
/// the normalizer itself stays a pure function of its arguments.
#[derive(Clone, Copy, Debug)]
pub struct NormalizeOptions {
    pub max_dimension: u32,
    pub quality: f32,
    pub payload_ceiling: usize,
}

impl From<&PipelineConfig> for NormalizeOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            quality: config.jpeg_quality,
            payload_ceiling: config.payload_ceiling,
        }
    }
}

/// A photo re-encoded for transport: JPEG bytes bounded in both dimensions
/// and serialized size. Consumed once by the generation client.
#[derive(Clone, Debug)]
pub struct NormalizedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Whether the source was downscaled (as opposed to only re-encoded).
    pub resized: bool,
    /// Quality the kept encoding actually used, after any back-off.
    pub quality: f32,
}

impl NormalizedImage {
    /// Serialize as the `data:` URI the generation endpoint expects.
    pub fn to_data_uri(&self) -> String {
        let mut out = String::with_capacity(data_uri_len(self.jpeg.len()));
        out.push_str(DATA_URI_JPEG_PREFIX);
        BASE64.encode_string(&self.jpeg, &mut out);
        out
    }
}

/// Serialized length of a JPEG payload of `jpeg_len` bytes as a data URI.
pub fn data_uri_len(jpeg_len: usize) -> usize {
    DATA_URI_JPEG_PREFIX.len() + jpeg_len.div_ceil(3) * 4
}

/// Target dimensions under the long-edge bound, preserving aspect ratio with
/// nearest-integer rounding of the short edge. Never upscales.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max_dimension {
        return (width, height);
    }
    let scale = f64::from(max_dimension) / f64::from(long);
    let round = |edge: u32| ((f64::from(edge) * scale).round() as u32).max(1);
    if width >= height {
        (max_dimension, round(height))
    } else {
        (round(width), max_dimension)
    }
}

/// Decode, bound, and re-encode a user-supplied photo.
///
/// Pure function of `(bytes, options)`: no network, no filesystem. Images
/// already within the dimension bound are not resized but are still
/// re-encoded to JPEG, so the transport format and payload size stay
/// predictable. If the encoded payload exceeds the configured ceiling, the
/// quality is stepped down until the payload fits or the floor is reached.
#[tracing::instrument(skip(bytes), fields(input_len = bytes.len()))]
pub fn normalize(bytes: &[u8], options: &NormalizeOptions) -> PortraitResult<NormalizedImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| PortraitError::decode(format!("decode source image: {e}")))?;

    let (src_w, src_h) = (decoded.width(), decoded.height());
    let (dst_w, dst_h) = target_dimensions(src_w, src_h, options.max_dimension);
    let resized = (dst_w, dst_h) != (src_w, src_h);

    let rgb = if resized {
        decoded
            .resize_exact(dst_w, dst_h, FilterType::Lanczos3)
            .to_rgb8()
    } else {
        decoded.to_rgb8()
    };

    let mut quality = options.quality.clamp(QUALITY_FLOOR, 1.0);
    let mut jpeg = encode_jpeg(&rgb, quality)?;
    while data_uri_len(jpeg.len()) > options.payload_ceiling && quality > QUALITY_FLOOR {
        // Clamp each step so the floor itself is always tried.
        quality = (quality - QUALITY_STEP).max(QUALITY_FLOOR);
        jpeg = encode_jpeg(&rgb, quality)?;
    }

    if data_uri_len(jpeg.len()) > options.payload_ceiling {
        tracing::warn!(
            payload = data_uri_len(jpeg.len()),
            ceiling = options.payload_ceiling,
            "normalized payload exceeds ceiling at the quality floor"
        );
    }

    Ok(NormalizedImage {
        jpeg,
        width: dst_w,
        height: dst_h,
        resized,
        quality,
    })
}

/// Best-effort serialization of undecodable source bytes, used when callers
/// degrade after a decode failure rather than blocking the user.
pub fn source_data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

fn encode_jpeg(rgb: &image::RgbImage, quality: f32) -> PortraitResult<Vec<u8>> {
    // image's encoder takes quality in 1..=100.
    let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut out), q);
    rgb.write_with_encoder(encoder)
        .context("encode normalized jpeg")?;
    Ok(out)
}
