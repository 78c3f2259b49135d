// Focus render - Detection visualization on the uploaded image
use crate::domain::diagnosis::{Detection, DiagnosisStatus};
use anyhow::Context;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{Luma, Rgb, RgbImage};
use imageproc::definitions::Image;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;

const BACKGROUND_SIGMA: f32 = 30.0;
const MASK_SIGMA: f32 = 15.0;
const FOCUS_RADIUS_RATIO: f64 = 0.6;
const RING_LAYERS: i32 = 5;
const CENTER_DOT_RADIUS: i32 = 6;
const JPEG_QUALITY: u8 = 95;

const HEALTHY_COLOR: Rgb<u8> = Rgb([100, 255, 50]);
const DISEASED_COLOR: Rgb<u8> = Rgb([255, 100, 50]);
const BOX_COLOR: Rgb<u8> = Rgb([255, 200, 100]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Base64 JPEGs returned to the client
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImages {
    pub original_image: String,
    pub result_image: String,
}

pub fn decode(bytes: &[u8]) -> Result<RgbImage, image::ImageError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

pub fn encode_base64_jpeg(image: &RgbImage) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode_image(image)
        .context("Failed to encode JPEG")?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buffer))
}

/// Draw the detections the way their status calls for: a blurred
/// background with a sharp focus circle for trusted results, plain boxes
/// otherwise, and the untouched image when nothing was found
pub fn render(
    image: &RgbImage,
    status: DiagnosisStatus,
    detections: &[Detection],
) -> anyhow::Result<RenderedImages> {
    let original_image = encode_base64_jpeg(image)?;
    let result_image = match (status, detections.first()) {
        (_, None) => original_image.clone(),
        (DiagnosisStatus::HighConfidence, Some(top)) => {
            let color = if top.is_healthy() {
                HEALTHY_COLOR
            } else {
                DISEASED_COLOR
            };
            encode_base64_jpeg(&blur_focus(image, &top.bbox, color))?
        }
        _ => {
            let mut annotated = image.clone();
            for detection in detections {
                draw_box(&mut annotated, &detection.bbox, BOX_COLOR, 2);
            }
            encode_base64_jpeg(&annotated)?
        }
    };

    Ok(RenderedImages {
        original_image,
        result_image,
    })
}

/// Detector boxes are clamped to the image before any geometry is derived
fn clamp_bbox(bbox: &[f64; 4], width: u32, height: u32) -> [i32; 4] {
    let (w, h) = (width as f64, height as f64);
    let [x1, y1, x2, y2] = *bbox;
    [x1.clamp(0.0, w), y1.clamp(0.0, h), x2.clamp(0.0, w), y2.clamp(0.0, h)].map(|c| c.trunc() as i32)
}

/// Blurred copy of the image with a sharp radial region around the box
/// centre, a fading ring border and a centre dot
pub fn blur_focus(image: &RgbImage, bbox: &[f64; 4], color: Rgb<u8>) -> RgbImage {
    let [x1, y1, x2, y2] = clamp_bbox(bbox, image.width(), image.height());
    let center = ((x1 + x2).div_euclid(2), (y1 + y2).div_euclid(2));
    let (box_w, box_h) = ((x2 - x1) as f64, (y2 - y1) as f64);
    let diagonal = (box_w * box_w + box_h * box_h).sqrt().trunc();
    let radius = ((diagonal * FOCUS_RADIUS_RATIO).trunc() as i32).max(1);

    let blurred = image::imageops::blur(image, BACKGROUND_SIGMA);
    let mask = focus_mask(image.width(), image.height(), center, radius as f32);

    let mut result = RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in result.enumerate_pixels_mut() {
        let m = mask.get_pixel(x, y)[0];
        let sharp = image.get_pixel(x, y);
        let soft = blurred.get_pixel(x, y);
        for c in 0..3 {
            let value = sharp[c] as f32 * m + soft[c] as f32 * (1.0 - m);
            pixel[c] = value as u8;
        }
    }

    for i in 0..RING_LAYERS {
        let thickness = 3 - i / 2;
        let alpha = 1.0 - i as f32 * 0.15;
        let faded = Rgb(color.0.map(|c| (c as f32 * alpha) as u8));
        draw_ring(&mut result, center, radius + i * 2, thickness, faded);
    }
    draw_filled_circle_mut(&mut result, center, CENTER_DOT_RADIUS, color);
    draw_ring(&mut result, center, CENTER_DOT_RADIUS, 2, WHITE);

    result
}

/// `clip(1 - d / r)` smoothed with a Gaussian
fn focus_mask(width: u32, height: u32, center: (i32, i32), radius: f32) -> Image<Luma<f32>> {
    let cone = Image::<Luma<f32>>::from_fn(width, height, |x, y| {
        let dx = x as f32 - center.0 as f32;
        let dy = y as f32 - center.1 as f32;
        Luma([(1.0 - (dx * dx + dy * dy).sqrt() / radius).clamp(0.0, 1.0)])
    });
    let mut smoothed = gaussian_blur_f32(&cone, MASK_SIGMA);
    for pixel in smoothed.pixels_mut() {
        pixel[0] = pixel[0].clamp(0.0, 1.0);
    }
    smoothed
}

/// Concentric one-pixel circles spanning `thickness` around `radius`
fn draw_ring(image: &mut RgbImage, center: (i32, i32), radius: i32, thickness: i32, color: Rgb<u8>) {
    let half = thickness / 2;
    for r in (radius - half).max(1)..=radius + half {
        draw_hollow_circle_mut(image, center, r, color);
    }
}

fn draw_box(image: &mut RgbImage, bbox: &[f64; 4], color: Rgb<u8>, thickness: i32) {
    let [x1, y1, x2, y2] = clamp_bbox(bbox, image.width(), image.height());
    for t in 0..thickness {
        let width = x2 - x1 + 1 - 2 * t;
        let height = y2 - y1 + 1 - 2 * t;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(x1 + t, y1 + t).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}
