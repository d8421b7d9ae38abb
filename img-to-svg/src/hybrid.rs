use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use std::path::Path;
use tracing::info;

/// Encode as PNG favouring speed over size: fast deflate, no per-row filter search.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut png_bytes, CompressionType::Fast, FilterType::NoFilter);
    img.write_with_encoder(encoder)
        .context("Failed to encode image as PNG")?;
    Ok(png_bytes)
}

/// Wrap the image in an SVG document as a single base64 PNG `<image>`.
pub fn render_hybrid_svg(img: &DynamicImage) -> Result<String> {
    let png_bytes = encode_png(img)?;
    let img_base64 = STANDARD.encode(&png_bytes);
    let (width, height) = (img.width(), img.height());

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" 
     width="{width}" height="{height}" viewBox="0 0 {width} {height}">
  <image width="{width}" height="{height}" 
         xlink:href="data:image/png;base64,{img_base64}"/>
</svg>"#
    ))
}

/// Write a hybrid SVG to `output_path`, replacing any existing file.
pub fn write_hybrid_svg(img: &DynamicImage, output_path: &Path) -> Result<()> {
    let svg = render_hybrid_svg(img)?;
    std::fs::write(output_path, svg.as_bytes())
        .with_context(|| format!("Failed to write SVG to {}", output_path.display()))?;

    info!(
        "Embedded {}x{} raster into {}",
        img.width(),
        img.height(),
        output_path.display()
    );
    Ok(())
}
