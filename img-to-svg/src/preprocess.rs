use image::DynamicImage;
use tracing::debug;

/// Fixed enhancement strengths applied before tracing.
pub const SHARPNESS_FACTOR: f32 = 1.2;
pub const CONTRAST_FACTOR: f32 = 1.1;

/// Smoothing kernel used as the "blurred" reference for sharpening.
const SMOOTH_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const SMOOTH_SCALE: f32 = 13.0;

/// RGB channels come first in both supported layouts; a fourth channel is alpha.
const COLOR_CHANNELS: usize = 3;

/// Prepare a decoded image for the tracer: normalize to RGB/RGBA and
/// optionally sharpen then boost contrast.
pub fn preprocess(img: DynamicImage, enhance: bool) -> DynamicImage {
    let img = normalize_color(img);
    if enhance {
        enhance_image(img)
    } else {
        img
    }
}

/// Keep 8-bit RGB and RGBA as they are; everything else (grayscale,
/// gray+alpha, 16-bit, float) becomes 8-bit RGB.
pub fn normalize_color(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other => {
            debug!("Converting {:?} image to RGB8", other.color());
            DynamicImage::ImageRgb8(other.to_rgb8())
        }
    }
}

/// Sharpness x1.2, then contrast x1.1. Alpha is left untouched.
pub fn enhance_image(img: DynamicImage) -> DynamicImage {
    match normalize_color(img) {
        DynamicImage::ImageRgba8(mut buf) => {
            let (width, height) = buf.dimensions();
            enhance_pixels(&mut buf, width as usize, height as usize, 4);
            DynamicImage::ImageRgba8(buf)
        }
        DynamicImage::ImageRgb8(mut buf) => {
            let (width, height) = buf.dimensions();
            enhance_pixels(&mut buf, width as usize, height as usize, 3);
            DynamicImage::ImageRgb8(buf)
        }
        other => other,
    }
}

fn enhance_pixels(data: &mut [u8], width: usize, height: usize, channels: usize) {
    sharpen(data, width, height, channels, SHARPNESS_FACTOR);
    adjust_contrast(data, channels, CONTRAST_FACTOR);
}

/// Blend each pixel away from its 3x3 smoothed value. Edge pixels have no
/// full neighbourhood and keep their value.
fn sharpen(data: &mut [u8], width: usize, height: usize, channels: usize, factor: f32) {
    if width < 3 || height < 3 {
        return;
    }

    let original = data.to_vec();

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = (y * width + x) * channels;
            for c in 0..COLOR_CHANNELS {
                let mut sum = 0u32;
                for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
                    for (kx, weight) in row.iter().enumerate() {
                        let n = ((y + ky - 1) * width + (x + kx - 1)) * channels + c;
                        sum += weight * original[n] as u32;
                    }
                }
                let smooth = (sum as f32 / SMOOTH_SCALE).round();
                data[idx + c] = blend(smooth, original[idx + c] as f32, factor);
            }
        }
    }
}

/// Blend every color channel away from the image's mean luminance.
fn adjust_contrast(data: &mut [u8], channels: usize, factor: f32) {
    let Some(mean) = mean_luminance(data, channels) else {
        return;
    };
    let mean = (mean + 0.5).floor() as f32;

    for px in data.chunks_exact_mut(channels) {
        for value in px.iter_mut().take(COLOR_CHANNELS) {
            *value = blend(mean, *value as f32, factor);
        }
    }
}

fn mean_luminance(data: &[u8], channels: usize) -> Option<f64> {
    let pixels = data.len() / channels;
    if pixels == 0 {
        return None;
    }

    let total: u64 = data
        .chunks_exact(channels)
        .map(|px| luminance(px[0], px[1], px[2]) as u64)
        .sum();

    Some(total as f64 / pixels as f64)
}

/// ITU-R 601 luma in 16-bit fixed point.
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// `degenerate + factor * (value - degenerate)`, truncated toward zero and
/// clamped to a byte.
fn blend(degenerate: f32, value: f32, factor: f32) -> u8 {
    let out = (degenerate + factor * (value - degenerate)) as i32;
    out.clamp(0, 255) as u8
}
