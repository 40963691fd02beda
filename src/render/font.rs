//! Font resolution with ordered fallback.
//!
//! Callers ask for "a font at N pixels" and always get one:
//!
//! - an explicitly configured font file, when given and loadable
//! - otherwise the first loadable font from a list of well-known system
//!   locations
//! - otherwise a built-in 5x7 bitmap glyph set scaled up to the requested
//!   size (low quality, but it cannot fail)
//!
//! Outline and bitmap variants share one measuring and drawing interface,
//! so layout code never cares which one it got.

use super::blend_pixel;
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Well-known font files probed in order when no font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Rows in a bitmap glyph.
const BITMAP_GLYPH_ROWS: u32 = 7;

/// Columns in a bitmap glyph.
const BITMAP_GLYPH_COLS: u32 = 5;

enum FontKind {
    Outline(FontVec),
    Bitmap,
}

/// Resolves fonts for the renderers. Construct once, share by reference.
pub struct FontProvider {
    kind: FontKind,
    source: String,
}

impl std::fmt::Debug for FontProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontProvider")
            .field("source", &self.source)
            .finish()
    }
}

impl FontProvider {
    /// Build a provider with the full fallback chain.
    ///
    /// A configured path that fails to load is logged and skipped, never
    /// fatal. The built-in bitmap glyphs are the final fallback, so this
    /// constructor always succeeds.
    pub fn new(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match load_outline_font(path) {
                Ok(font) => {
                    tracing::debug!(path = %path.display(), "Loaded configured font");
                    return Self {
                        kind: FontKind::Outline(font),
                        source: path.display().to_string(),
                    };
                }
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %error,
                        "Configured font could not be loaded, falling back"
                    );
                }
            }
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            if let Ok(font) = load_outline_font(path) {
                tracing::debug!(path = %path.display(), "Loaded system font");
                return Self {
                    kind: FontKind::Outline(font),
                    source: candidate.to_string(),
                };
            }
        }

        tracing::debug!("No outline font available, using built-in bitmap glyphs");
        Self::builtin()
    }

    /// Provider pinned to the built-in bitmap glyphs. Deterministic on any
    /// machine, which is what rendering tests want.
    pub fn builtin() -> Self {
        Self {
            kind: FontKind::Bitmap,
            source: "builtin".to_string(),
        }
    }

    /// Where the active font came from (a path, or "builtin").
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Resolve the font at a pixel size.
    pub fn resolve(&self, px: f32) -> ResolvedFont<'_> {
        match &self.kind {
            FontKind::Outline(font) => ResolvedFont::Outline {
                font,
                scale: PxScale::from(px),
            },
            FontKind::Bitmap => ResolvedFont::Bitmap {
                block: bitmap_block(px),
            },
        }
    }
}

fn load_outline_font(path: &Path) -> Result<FontVec, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    FontVec::try_from_vec(data).map_err(|e| e.to_string())
}

/// Side length of the square block each bitmap font pixel scales to.
fn bitmap_block(px: f32) -> u32 {
    ((px / BITMAP_GLYPH_ROWS as f32).round() as u32).max(1)
}

/// A font fixed at one pixel size, ready to measure and draw.
pub enum ResolvedFont<'a> {
    Outline { font: &'a FontVec, scale: PxScale },
    Bitmap { block: u32 },
}

impl ResolvedFont<'_> {
    /// Height of one line of text in pixels.
    pub fn line_height(&self) -> f32 {
        match self {
            ResolvedFont::Outline { font, scale } => font.as_scaled(*scale).height(),
            ResolvedFont::Bitmap { block } => ((BITMAP_GLYPH_ROWS + 2) * block) as f32,
        }
    }

    /// Distance from the top of a line to the baseline.
    pub fn ascent(&self) -> f32 {
        match self {
            ResolvedFont::Outline { font, scale } => font.as_scaled(*scale).ascent(),
            ResolvedFont::Bitmap { block } => (BITMAP_GLYPH_ROWS * block) as f32,
        }
    }

    /// Width of `text` in pixels, including kerning for outline fonts.
    pub fn measure(&self, text: &str) -> u32 {
        match self {
            ResolvedFont::Outline { font, scale } => {
                let scaled = font.as_scaled(*scale);

                let mut width = 0.0f32;
                let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

                for c in text.chars() {
                    let glyph_id = scaled.glyph_id(c);
                    if let Some(prev) = prev_glyph {
                        width += scaled.kern(prev, glyph_id);
                    }
                    width += scaled.h_advance(glyph_id);
                    prev_glyph = Some(glyph_id);
                }

                width.ceil() as u32
            }
            ResolvedFont::Bitmap { block } => {
                let count = text.chars().count() as u32;
                if count == 0 {
                    0
                } else {
                    // One block of spacing between glyphs, none after the last
                    count * (BITMAP_GLYPH_COLS + 1) * block - block
                }
            }
        }
    }

    /// Draw `text` onto `canvas` with its left edge at `x` and its baseline
    /// at `baseline`. Pixels outside the canvas are dropped; glyph coverage
    /// is multiplied into the alpha of `color` and alpha-blended over what
    /// is already there.
    pub fn draw(&self, canvas: &mut RgbaImage, x: f32, baseline: f32, text: &str, color: Rgba<u8>) {
        match self {
            ResolvedFont::Outline { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let canvas_width = canvas.width() as i32;
                let canvas_height = canvas.height() as i32;

                let mut cursor_x = x;
                let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

                for c in text.chars() {
                    let glyph_id = scaled.glyph_id(c);
                    if let Some(prev) = prev_glyph {
                        cursor_x += scaled.kern(prev, glyph_id);
                    }

                    let glyph = glyph_id
                        .with_scale_and_position(*scale, ab_glyph::point(cursor_x, baseline));

                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();

                        outlined.draw(|px, py, coverage| {
                            let cx = px as i32 + bounds.min.x as i32;
                            let cy = py as i32 + bounds.min.y as i32;

                            if cx >= 0 && cy >= 0 && cx < canvas_width && cy < canvas_height {
                                let pixel_alpha = (coverage * color[3] as f32) as u8;
                                if pixel_alpha == 0 {
                                    return;
                                }
                                let top = Rgba([color[0], color[1], color[2], pixel_alpha]);
                                let existing = canvas.get_pixel(cx as u32, cy as u32);
                                let blended = blend_pixel(*existing, top);
                                canvas.put_pixel(cx as u32, cy as u32, blended);
                            }
                        });
                    }

                    cursor_x += scaled.h_advance(glyph_id);
                    prev_glyph = Some(glyph_id);
                }
            }
            ResolvedFont::Bitmap { block } => {
                let top = baseline - (BITMAP_GLYPH_ROWS * block) as f32;
                let advance = ((BITMAP_GLYPH_COLS + 1) * block) as i32;

                let mut cursor_x = x.round() as i32;
                let cursor_y = top.round() as i32;

                for c in text.chars() {
                    draw_bitmap_glyph(canvas, cursor_x, cursor_y, c, color, *block);
                    cursor_x += advance;
                }
            }
        }
    }
}

/// Draw one bitmap glyph with its top-left corner at (x, y), each font
/// pixel expanded to a block x block square.
fn draw_bitmap_glyph(canvas: &mut RgbaImage, x: i32, y: i32, ch: char, color: Rgba<u8>, block: u32) {
    let rows = glyph_rows(ch).unwrap_or(UNKNOWN_GLYPH);
    let (width, height) = canvas.dimensions();

    for (row_idx, row_bits) in rows.iter().enumerate() {
        for col in 0..BITMAP_GLYPH_COLS {
            let on = (row_bits >> (BITMAP_GLYPH_COLS - 1 - col)) & 1 == 1;
            if !on {
                continue;
            }
            for dy in 0..block {
                for dx in 0..block {
                    let px = x + (col * block + dx) as i32;
                    let py = y + (row_idx as u32 * block + dy) as i32;
                    if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                        let existing = canvas.get_pixel(px as u32, py as u32);
                        let blended = blend_pixel(*existing, color);
                        canvas.put_pixel(px as u32, py as u32, blended);
                    }
                }
            }
        }
    }
}

fn glyph_rows(ch: char) -> Option<[u8; 7]> {
    // Lowercase shares the uppercase shapes; the set is deliberately small
    let ch = ch.to_ascii_uppercase();
    GLYPHS_5X7
        .iter()
        .find(|(key, _)| *key == ch)
        .map(|(_, rows)| *rows)
}

/// Shape drawn for characters outside the built-in set ('?').
const UNKNOWN_GLYPH: [u8; 7] = [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100];

// Each row is 5 bits, most significant bit on the left.
#[rustfmt::skip]
const GLYPHS_5X7: &[(char, [u8; 7])] = &[
    (' ', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    ('3', [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
    ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
    ('X', [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
    ('Y', [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100]),
    ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
    ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100]),
    (',', [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000]),
    ('!', [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100]),
    ('?', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100]),
    (':', [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000]),
    (';', [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000]),
    ('-', [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
    ('_', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111]),
    ('\'', [0b01100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('"', [0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('(', [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010]),
    (')', [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000]),
    ('/', [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000]),
    ('+', [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]),
    ('=', [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000]),
    ('*', [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000]),
    ('@', [0b01110, 0b10001, 0b00001, 0b01101, 0b10101, 0b10101, 0b01110]),
    ('#', [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010]),
    ('%', [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011]),
    ('&', [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101]),
];
