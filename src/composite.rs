use std::io::Cursor;
use std::path::Path;

use image::RgbaImage;
use rusttype::{Font, Scale, point};

use crate::error::{PortraitError, PortraitResult};
use crate::model::{PlayerMetadata, Sport};

/// All overlay metrics are expressed relative to this width, so the layout
/// is resolution-independent.
const REFERENCE_WIDTH: f32 = 800.0;

/// Scrim stops: fully transparent at 70% height, 60% black at 85%, 85% black
/// at the bottom edge.
const SCRIM_START: f32 = 0.70;
const SCRIM_MID: f32 = 0.85;
const SCRIM_MID_ALPHA: f32 = 0.60;
const SCRIM_BOTTOM_ALPHA: f32 = 0.85;

const NAME_SIZE: f32 = 28.0;
const SUBTITLE_SIZE: f32 = 14.0;
const WATERMARK_SIZE: f32 = 72.0;

const SUBTITLE_SEPARATOR: &str = "  ·  ";

/// Final deliverable. `width`/`height` are zero when the generated payload
/// did not decode and the bytes passed through unmodified.
#[derive(Clone, Debug)]
pub struct CompositeResult {
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Whether the overlay was actually applied.
    pub composited: bool,
}

/// Overlay typeface, loaded from disk. Fonts are never bundled; when none is
/// available the compositor skips text layers and still paints the scrim.
pub struct OverlayFont {
    font: Font<'static>,
}

impl OverlayFont {
    pub fn from_vec(bytes: Vec<u8>) -> PortraitResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| PortraitError::decode("font bytes did not parse"))?;
        Ok(Self { font })
    }

    pub fn load(path: &Path) -> PortraitResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| PortraitError::validation(format!("read font '{}': {e}", path.display())))?;
        Self::from_vec(bytes)
    }

    /// Probe well-known system font locations, preferring a bold face.
    pub fn locate() -> Option<Self> {
        const CANDIDATES: &[&str] = &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
            "C:\\Windows\\Fonts\\arialbd.ttf",
        ];
        CANDIDATES
            .iter()
            .find_map(|p| Self::load(Path::new(p)).ok())
    }
}

/// The secondary line above the name: `#<number>`, position, and sport label
/// joined with middle-dot separators; empty parts are omitted.
pub fn subtitle_line(meta: &PlayerMetadata, sport: Option<Sport>) -> String {
    let meta = meta.trimmed();
    let mut parts = Vec::new();
    if !meta.number.is_empty() {
        parts.push(format!("#{}", meta.number));
    }
    if !meta.position.is_empty() {
        parts.push(meta.position);
    }
    if let Some(sport) = sport {
        parts.push(sport.label().to_string());
    }
    parts.join(SUBTITLE_SEPARATOR)
}

/// Render the identity overlay onto a generated portrait.
///
/// Pure function of its inputs (image bytes, metadata, sport, font bytes);
/// identical inputs yield byte-identical output. Fails closed: if the
/// payload does not decode, the bytes are returned unmodified: the overlay
/// is a presentation enhancement, not a correctness requirement.
#[tracing::instrument(skip_all, fields(input_len = generated.len()))]
pub fn composite(
    generated: &[u8],
    meta: &PlayerMetadata,
    sport: Option<Sport>,
    font: Option<&OverlayFont>,
) -> CompositeResult {
    let decoded = match image::load_from_memory(generated) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("generated image did not decode, skipping overlay: {e}");
            return CompositeResult {
                image: generated.to_vec(),
                width: 0,
                height: 0,
                composited: false,
            };
        }
    };

    let mut surface = decoded.to_rgba8();
    let (width, height) = surface.dimensions();
    let scale = width as f32 / REFERENCE_WIDTH;

    paint_scrim(&mut surface);

    if let Some(font) = font {
        let meta = meta.trimmed();
        let font = &font.font;
        let pad = 24.0 * scale;

        if !meta.number.is_empty() {
            // Low-opacity numeral watermark anchored near the bottom-right.
            let size = WATERMARK_SIZE * scale;
            let text_w = line_width(font, size, &meta.number);
            let layer = TextLayer {
                size,
                origin_x: width as f32 - pad - text_w,
                baseline_y: height as f32 - 32.0 * scale,
                color: [255, 255, 255],
                opacity: 0.15,
                shadow: None,
            };
            draw_line(&mut surface, font, &meta.number, &layer);
        }

        let shadow = Shadow {
            offset: (2.0 * scale).max(1.0),
            radius: ((2.0 * scale).round() as u32).max(1),
            opacity: 0.55,
        };
        let name_baseline = height as f32 - 40.0 * scale;

        if !meta.name.is_empty() {
            let layer = TextLayer {
                size: NAME_SIZE * scale,
                origin_x: pad,
                baseline_y: name_baseline,
                color: [255, 255, 255],
                opacity: 1.0,
                shadow: Some(shadow),
            };
            draw_line(&mut surface, font, &meta.display_name(), &layer);
        }

        let subtitle = subtitle_line(&meta, sport);
        if !subtitle.is_empty() {
            let layer = TextLayer {
                size: SUBTITLE_SIZE * scale,
                origin_x: pad,
                baseline_y: name_baseline - 38.0 * scale,
                color: [255, 255, 255],
                opacity: 0.78,
                shadow: Some(shadow),
            };
            draw_line(&mut surface, font, &subtitle, &layer);
        }
    } else if !meta.trimmed().name.is_empty() || !meta.trimmed().number.is_empty() {
        tracing::warn!("no overlay font available, rendering scrim only");
    }

    let mut out = Vec::new();
    if let Err(e) = image::DynamicImage::ImageRgba8(surface)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
    {
        tracing::warn!("encode composited png failed, returning original: {e}");
        return CompositeResult {
            image: generated.to_vec(),
            width: 0,
            height: 0,
            composited: false,
        };
    }

    CompositeResult {
        image: out,
        width,
        height,
        composited: true,
    }
}

/// Vertical gradient over the bottom 30%, piecewise-linear between the stops.
fn paint_scrim(surface: &mut RgbaImage) {
    let (width, height) = surface.dimensions();
    let start_row = (height as f32 * SCRIM_START).floor() as u32;
    for y in start_row..height {
        let alpha = scrim_alpha(y as f32 / height as f32);
        if alpha <= 0.0 {
            continue;
        }
        let keep = 1.0 - alpha;
        for x in 0..width {
            let px = surface.get_pixel_mut(x, y);
            px.0[0] = (px.0[0] as f32 * keep) as u8;
            px.0[1] = (px.0[1] as f32 * keep) as u8;
            px.0[2] = (px.0[2] as f32 * keep) as u8;
        }
    }
}

fn scrim_alpha(y_frac: f32) -> f32 {
    if y_frac < SCRIM_START {
        0.0
    } else if y_frac < SCRIM_MID {
        let t = (y_frac - SCRIM_START) / (SCRIM_MID - SCRIM_START);
        t * SCRIM_MID_ALPHA
    } else {
        let t = (y_frac - SCRIM_MID) / (1.0 - SCRIM_MID);
        SCRIM_MID_ALPHA + t * (SCRIM_BOTTOM_ALPHA - SCRIM_MID_ALPHA)
    }
}

#[derive(Clone, Copy)]
struct Shadow {
    offset: f32,
    radius: u32,
    opacity: f32,
}

struct TextLayer {
    size: f32,
    origin_x: f32,
    baseline_y: f32,
    color: [u8; 3],
    opacity: f32,
    shadow: Option<Shadow>,
}

fn draw_line(surface: &mut RgbaImage, font: &Font<'_>, text: &str, layer: &TextLayer) {
    let (width, height) = surface.dimensions();

    if let Some(shadow) = layer.shadow {
        let mut mask = CoverageMask::new(width, height);
        rasterize_line(
            &mut mask,
            font,
            layer.size,
            layer.origin_x + shadow.offset,
            layer.baseline_y + shadow.offset,
            text,
        );
        mask.box_blur(shadow.radius);
        tint(surface, &mask, [0, 0, 0], shadow.opacity);
    }

    let mut mask = CoverageMask::new(width, height);
    rasterize_line(
        &mut mask,
        font,
        layer.size,
        layer.origin_x,
        layer.baseline_y,
        text,
    );
    tint(surface, &mask, layer.color, layer.opacity);
}

/// Advance-based width of a single text line at the given pixel size.
fn line_width(font: &Font<'_>, size: f32, text: &str) -> f32 {
    let scale = Scale::uniform(size);
    font.layout(text, scale, point(0.0, 0.0))
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .last()
        .unwrap_or(0.0)
}

/// Single-channel glyph coverage accumulator, blurred for soft shadows and
/// tinted onto the surface afterwards.
struct CoverageMask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    fn accumulate(&mut self, x: i32, y: i32, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        let add = (coverage * 255.0).round().clamp(0.0, 255.0) as u8;
        self.data[idx] = self.data[idx].saturating_add(add);
    }

    /// Two-pass separable box blur with edge clamping.
    fn box_blur(&mut self, radius: u32) {
        if radius == 0 {
            return;
        }
        let (w, h) = (self.width as i32, self.height as i32);
        let r = radius as i32;
        let count = (2 * r + 1) as u32;

        let mut tmp = vec![0u8; self.data.len()];
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0u32;
                for dx in -r..=r {
                    let sx = (x + dx).clamp(0, w - 1);
                    acc += u32::from(self.data[(y * w + sx) as usize]);
                }
                tmp[(y * w + x) as usize] = ((acc + count / 2) / count) as u8;
            }
        }
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0u32;
                for dy in -r..=r {
                    let sy = (y + dy).clamp(0, h - 1);
                    acc += u32::from(tmp[(sy * w + x) as usize]);
                }
                self.data[(y * w + x) as usize] = ((acc + count / 2) / count) as u8;
            }
        }
    }
}

fn rasterize_line(
    mask: &mut CoverageMask,
    font: &Font<'_>,
    size: f32,
    origin_x: f32,
    baseline_y: f32,
    text: &str,
) {
    let scale = Scale::uniform(size);
    for glyph in font.layout(text, scale, point(origin_x, baseline_y)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                mask.accumulate(gx as i32 + bb.min.x, gy as i32 + bb.min.y, v);
            });
        }
    }
}

fn tint(surface: &mut RgbaImage, mask: &CoverageMask, color: [u8; 3], opacity: f32) {
    for (idx, &coverage) in mask.data.iter().enumerate() {
        if coverage == 0 {
            continue;
        }
        let x = (idx % mask.width as usize) as u32;
        let y = (idx / mask.width as usize) as u32;
        let a = f32::from(coverage) / 255.0 * opacity;
        let inv = 1.0 - a;
        let px = surface.get_pixel_mut(x, y);
        px.0[0] = (f32::from(color[0]) * a + f32::from(px.0[0]) * inv) as u8;
        px.0[1] = (f32::from(color[1]) * a + f32::from(px.0[1]) * inv) as u8;
        px.0[2] = (f32::from(color[2]) * a + f32::from(px.0[2]) * inv) as u8;
        px.0[3] = px.0[3].max((a * 255.0) as u8);
    }
}
