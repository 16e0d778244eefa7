//! Pipeline execution.
//!
//! Operations mutate a shared context (pending format, pending quality);
//! resize resampling is delegated to the `image` crate, with parameters
//! computed by the geometry module. After all operations run the image is
//! re-encoded with the final format (fallback: the original decoded format)
//! and final quality (fallback: 85).

use std::io::Cursor;

use assetgate_core::constants::DEFAULT_QUALITY;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};

use super::geometry::{content_box, resolve_target};
use super::{Operation, OutputFormat, Pipeline, PipelineError, ResizeMode, ResizeSpec};

/// Re-encoded pipeline output.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

/// Content types the gatekeeper will run a pipeline against.
pub fn is_supported_image(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    matches!(
        essence.to_ascii_lowercase().as_str(),
        "image/jpeg" | "image/jpg" | "image/png" | "image/webp" | "image/gif" | "image/bmp"
    )
}

/// Apply a parsed pipeline to encoded image bytes.
pub fn apply_pipeline(data: &[u8], pipeline: &Pipeline) -> Result<TransformedImage, PipelineError> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let source_format = reader.format();
    let mut img = reader
        .decode()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    let mut pending_format: Option<OutputFormat> = None;
    let mut pending_quality: Option<u8> = None;

    for operation in &pipeline.operations {
        match operation {
            Operation::Format(format) => pending_format = Some(*format),
            Operation::Quality(quality) => pending_quality = Some(*quality),
            Operation::Resize(spec) => img = apply_resize(img, spec),
        }
    }

    let format = pending_format
        .or_else(|| source_format.and_then(output_format_for))
        .unwrap_or(OutputFormat::Jpg);
    let quality = pending_quality.unwrap_or(DEFAULT_QUALITY);

    let bytes = encode(&img, format, quality)?;
    Ok(TransformedImage {
        bytes,
        content_type: format.content_type(),
    })
}

fn apply_resize(img: DynamicImage, spec: &ResizeSpec) -> DynamicImage {
    let (src_w, src_h) = img.dimensions();
    let (target_w, target_h) = resolve_target(spec, src_w, src_h);

    match spec.mode {
        ResizeMode::Fixed => img.resize_exact(target_w, target_h, FilterType::Lanczos3),
        ResizeMode::Lfit | ResizeMode::Mfit => {
            let (w, h) = content_box(spec.mode, src_w, src_h, target_w, target_h);
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
        ResizeMode::Pad => {
            let (w, h) = content_box(ResizeMode::Lfit, src_w, src_h, target_w, target_h);
            let content = img.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();

            let fill = Rgba([spec.pad_color.r, spec.pad_color.g, spec.pad_color.b, 255]);
            let mut canvas = RgbaImage::from_pixel(target_w, target_h, fill);
            let x = (target_w.saturating_sub(w) / 2) as i64;
            let y = (target_h.saturating_sub(h) / 2) as i64;
            image::imageops::overlay(&mut canvas, &content, x, y);
            DynamicImage::ImageRgba8(canvas)
        }
    }
}

/// Map a decoded source format onto a pipeline output format, for the
/// no-explicit-format fallback.
fn output_format_for(format: ImageFormat) -> Option<OutputFormat> {
    match format {
        ImageFormat::Jpeg => Some(OutputFormat::Jpg),
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::Bmp => Some(OutputFormat::Png),
        ImageFormat::WebP => Some(OutputFormat::Webp),
        _ => None,
    }
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Bytes, PipelineError> {
    let mut buffer = Vec::new();
    match format {
        OutputFormat::Jpg => {
            // JPEG has no alpha channel.
            let rgb = img.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| PipelineError::Encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new(Cursor::new(&mut buffer));
            img.write_with_encoder(encoder)
                .map_err(|e| PipelineError::Encode(e.to_string()))?;
        }
        OutputFormat::Webp => {
            // The image crate's WebP encoder is lossless; quality is moot.
            let encoder = WebPEncoder::new_lossless(Cursor::new(&mut buffer));
            img.write_with_encoder(encoder)
                .map_err(|e| PipelineError::Encode(e.to_string()))?;
        }
    }
    Ok(Bytes::from(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::parse_pipeline;
    use image::RgbImage;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 20, 30]),
        ));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn dimensions_of(data: &[u8]) -> (u32, u32) {
        image::load_from_memory(data).unwrap().dimensions()
    }

    #[test]
    fn test_lfit_resize_stays_within_target() {
        let data = png_fixture(400, 300);
        let pipeline = parse_pipeline("image/resize,m_lfit,w_200,h_100").unwrap();
        let out = apply_pipeline(&data, &pipeline).unwrap();
        assert_eq!(dimensions_of(&out.bytes), (133, 100));
        assert_eq!(out.content_type, "image/png");
    }

    #[test]
    fn test_mfit_resize_covers_target() {
        let data = png_fixture(400, 300);
        let pipeline = parse_pipeline("image/resize,m_mfit,w_200,h_100").unwrap();
        let out = apply_pipeline(&data, &pipeline).unwrap();
        assert_eq!(dimensions_of(&out.bytes), (200, 150));
    }

    #[test]
    fn test_pad_produces_exact_canvas_with_fill() {
        let data = png_fixture(40, 30);
        let pipeline = parse_pipeline("image/resize,m_pad,w_20,h_20,color_FF0000").unwrap();
        let out = apply_pipeline(&data, &pipeline).unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(img.dimensions(), (20, 20));
        // Content is 20x15 centered; the top rows are pad fill.
        let top = img.get_pixel(0, 0);
        assert_eq!(top, Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_fixed_resize_forces_exact_dimensions() {
        let data = png_fixture(40, 30);
        let pipeline = parse_pipeline("image/resize,m_fixed,w_10,h_10").unwrap();
        let out = apply_pipeline(&data, &pipeline).unwrap();
        assert_eq!(dimensions_of(&out.bytes), (10, 10));
    }

    #[test]
    fn test_format_conversion_changes_content_type() {
        let data = png_fixture(8, 8);
        let pipeline = parse_pipeline("image/format,jpg/quality,Q_90").unwrap();
        let out = apply_pipeline(&data, &pipeline).unwrap();
        assert_eq!(out.content_type, "image/jpeg");
        assert!(image::load_from_memory(&out.bytes).is_ok());
    }

    #[test]
    fn test_no_format_falls_back_to_source_format() {
        let data = png_fixture(8, 8);
        let pipeline = parse_pipeline("image/quality,Q_50").unwrap();
        let out = apply_pipeline(&data, &pipeline).unwrap();
        assert_eq!(out.content_type, "image/png");
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let pipeline = parse_pipeline("image/format,png").unwrap();
        assert!(matches!(
            apply_pipeline(b"not an image", &pipeline),
            Err(PipelineError::Decode(_))
        ));
    }

    #[test]
    fn test_supported_image_content_types() {
        assert!(is_supported_image("image/png"));
        assert!(is_supported_image("image/jpeg; charset=binary"));
        assert!(!is_supported_image("application/pdf"));
        assert!(!is_supported_image("text/html"));
    }
}
