// Renderer public API tests
// Exercise TextRenderer end to end with the deterministic built-in font

use image::{Rgba, RgbaImage};
use std::io::Cursor;
use utakata::render::{FontProvider, RenderError, RenderOptions, TextRenderer};

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

fn flat_photo(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    png_bytes(&RgbaImage::from_pixel(width, height, Rgba(pixel)))
}

fn any_lit(image: &RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) -> bool {
    (y0..y1).any(|y| (x0..x1).any(|x| image.get_pixel(x, y)[0] > 20))
}

#[test]
fn test_empty_text_passes_bytes_through_every_renderer() {
    let renderer = TextRenderer::builtin();
    let input = flat_photo(100, 80, [255, 255, 255, 255]);

    assert_eq!(renderer.caption_bottom(&input, "").unwrap(), input);
    assert_eq!(renderer.watermark_center(&input, "").unwrap(), input);
    assert_eq!(renderer.watermark_tiled(&input, "").unwrap(), input);
}

#[test]
fn test_caption_produces_jpeg_with_same_dimensions() {
    let renderer = TextRenderer::builtin();
    let input = flat_photo(320, 240, [255, 255, 255, 255]);

    let output = renderer.caption_bottom(&input, "hello from the tests").unwrap();

    assert_eq!(&output[..2], &[0xFF, 0xD8], "not a JPEG");
    let decoded = image::load_from_memory(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
}

#[test]
fn test_caption_darkens_the_bottom_edge_only() {
    let renderer = TextRenderer::builtin();
    let input = flat_photo(320, 240, [255, 255, 255, 255]);

    let output = renderer.caption_bottom(&input, "hi").unwrap();
    let decoded = image::load_from_memory(&output).unwrap().to_rgba8();

    let top = decoded.get_pixel(160, 10);
    let bottom = decoded.get_pixel(4, 235);
    assert!(top[0] > 220, "top edge should stay bright, got {}", top[0]);
    assert!(bottom[0] < 200, "bar should darken the bottom, got {}", bottom[0]);
}

#[test]
fn test_watermark_center_marks_the_middle() {
    let renderer = TextRenderer::builtin();
    let input = flat_photo(400, 300, [0, 0, 0, 255]);

    let output = renderer.watermark_center(&input, "DRAFT").unwrap();
    let decoded = image::load_from_memory(&output).unwrap().to_rgba8();

    assert!(any_lit(&decoded, 133, 100, 266, 200), "middle third untouched");
    assert!(!any_lit(&decoded, 0, 0, 40, 40), "corner should stay black");
}

#[test]
fn test_watermark_tiled_reaches_every_quadrant() {
    let renderer = TextRenderer::builtin();
    let input = flat_photo(400, 300, [0, 0, 0, 255]);

    let output = renderer.watermark_tiled(&input, "DRAFT").unwrap();
    let decoded = image::load_from_memory(&output).unwrap().to_rgba8();

    assert!(any_lit(&decoded, 0, 0, 200, 150), "upper left untouched");
    assert!(any_lit(&decoded, 200, 0, 400, 150), "upper right untouched");
    assert!(any_lit(&decoded, 0, 150, 200, 300), "lower left untouched");
    assert!(any_lit(&decoded, 200, 150, 400, 300), "lower right untouched");
}

#[test]
fn test_undecodable_input_reports_decode_failure() {
    let renderer = TextRenderer::builtin();
    let error = renderer.caption_bottom(b"certainly not an image", "x").unwrap_err();

    assert!(matches!(error, RenderError::DecodeFailed { .. }));
    assert!(error.to_string().contains("Failed to decode image"));
}

#[test]
fn test_custom_quality_output_still_decodes() {
    let renderer = TextRenderer::new(
        FontProvider::builtin(),
        RenderOptions {
            jpeg_quality: 30,
            watermark_angle: 30.0,
        },
    );
    let input = flat_photo(200, 150, [128, 128, 128, 255]);

    let output = renderer.caption_bottom(&input, "low quality").unwrap();
    let decoded = image::load_from_memory(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));
}
