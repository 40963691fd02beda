// Font provider unit tests
// Extracted from src/render/font.rs for improved readability

use image::{Rgba, RgbaImage};
use std::path::Path;
use utakata::render::FontProvider;

#[test]
fn test_builtin_provider_reports_its_source() {
    let fonts = FontProvider::builtin();
    assert_eq!(fonts.source(), "builtin");
}

#[test]
fn test_unloadable_configured_font_falls_back() {
    let fonts = FontProvider::new(Some(Path::new("/definitely/not/a/font.ttf")));
    // Whatever the machine offers, construction never fails
    assert!(!fonts.source().is_empty());
}

#[test]
fn test_measure_is_monotonic_in_text_length() {
    let fonts = FontProvider::builtin();
    let font = fonts.resolve(24.0);

    let short = font.measure("hi");
    let long = font.measure("hi there");
    assert!(long > short);
    assert_eq!(font.measure(""), 0);
}

#[test]
fn test_metrics_scale_with_pixel_size() {
    let fonts = FontProvider::builtin();

    let small = fonts.resolve(12.0);
    let large = fonts.resolve(48.0);

    assert!(large.measure("sample") > small.measure("sample"));
    assert!(large.line_height() > small.line_height());
    assert!(large.ascent() > small.ascent());
}

#[test]
fn test_ascent_fits_inside_line_height() {
    let fonts = FontProvider::builtin();
    for px in [10.0, 18.0, 24.0, 36.0, 72.0] {
        let font = fonts.resolve(px);
        assert!(
            font.ascent() <= font.line_height(),
            "ascent exceeds line height at {px}px"
        );
    }
}

#[test]
fn test_draw_leaves_visible_pixels() {
    let fonts = FontProvider::builtin();
    let font = fonts.resolve(21.0);

    let mut canvas = RgbaImage::from_pixel(200, 60, Rgba([0, 0, 0, 255]));
    font.draw(&mut canvas, 4.0, 40.0, "HELLO", Rgba([255, 255, 255, 255]));

    let lit = canvas.pixels().filter(|p| p[0] > 128).count();
    assert!(lit > 0, "drawing produced no visible pixels");
}

#[test]
fn test_draw_with_transparent_color_is_invisible() {
    let fonts = FontProvider::builtin();
    let font = fonts.resolve(21.0);

    let mut canvas = RgbaImage::from_pixel(200, 60, Rgba([0, 0, 0, 255]));
    font.draw(&mut canvas, 4.0, 40.0, "HELLO", Rgba([255, 255, 255, 0]));

    let lit = canvas.pixels().filter(|p| p[0] > 0).count();
    assert_eq!(lit, 0);
}
