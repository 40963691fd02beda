// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers improves maintainability
// and makes it easier to understand and modify defaults.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

// =============================================================================
// Storage defaults
// =============================================================================

/// Default data directory (database and blob files live under it)
pub const DEFAULT_DATA_DIR: &str = "storage";

/// Database filename inside the data directory
pub const LINKS_DB_FILENAME: &str = "links.db";

/// Blob subdirectory inside the data directory
pub const FILES_SUBDIR: &str = "files";

/// Default maximum attempts when a generated token collides
pub const DEFAULT_MAX_CREATE_RETRIES: u32 = 3;

/// Random bytes in a link token before url-safe encoding
pub const TOKEN_BYTES: usize = 16;

/// Random bytes in a blob filename before url-safe encoding
pub const FILENAME_BYTES: usize = 12;

// =============================================================================
// Render defaults
// =============================================================================

/// Default JPEG encode quality (1-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Default watermark rotation in degrees (clockwise)
pub const DEFAULT_WATERMARK_ANGLE: f32 = 30.0;

/// Caption font size as a fraction of image width
pub const CAPTION_FONT_RATIO: f32 = 0.06;

/// Minimum caption font size in pixels
pub const CAPTION_MIN_FONT_PX: f32 = 18.0;

/// Caption bar padding as a fraction of image width
pub const CAPTION_PADDING_RATIO: f32 = 0.03;

/// Minimum caption bar padding in pixels
pub const CAPTION_MIN_PADDING: u32 = 10;

/// Caption line spacing as a fraction of the font size
pub const CAPTION_SPACING_RATIO: f32 = 0.3;

/// Minimum caption line spacing in pixels
pub const CAPTION_MIN_SPACING: u32 = 4;

/// Text stroke width in pixels
pub const STROKE_WIDTH: u32 = 2;

/// Caption bar alpha (0-255)
pub const CAPTION_BAR_ALPHA: u8 = 160;

/// Caption stroke alpha (0-255)
pub const CAPTION_STROKE_ALPHA: u8 = 200;

/// Centered watermark font size as a fraction of image width
pub const WATERMARK_CENTER_FONT_RATIO: f32 = 0.08;

/// Minimum centered watermark font size in pixels
pub const WATERMARK_CENTER_MIN_FONT_PX: f32 = 20.0;

/// Centered watermark fill alpha (0-255)
pub const WATERMARK_CENTER_FILL_ALPHA: u8 = 64;

/// Centered watermark stroke alpha (0-255)
pub const WATERMARK_CENTER_STROKE_ALPHA: u8 = 96;

/// Tiled watermark font size as a fraction of image width
pub const WATERMARK_TILE_FONT_RATIO: f32 = 0.045;

/// Minimum tiled watermark font size in pixels
pub const WATERMARK_TILE_MIN_FONT_PX: f32 = 14.0;

/// Tiled watermark fill alpha (0-255)
pub const WATERMARK_TILE_FILL_ALPHA: u8 = 56;

/// Tiled watermark stroke alpha (0-255)
pub const WATERMARK_TILE_STROKE_ALPHA: u8 = 88;

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level filter
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log output format ("pretty" or "json")
pub const DEFAULT_LOG_FORMAT: &str = "pretty";

/// Characters of a token that may appear in log fields
pub const TOKEN_LOG_PREFIX_LEN: usize = 8;
