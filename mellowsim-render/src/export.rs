//! PNG export with embedded region metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use mellowsim_core::Region;

use crate::channel::Channel;
use crate::color::Hsv;
use crate::error::RenderError;

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub x_start: f64,
    pub x_end: f64,
    pub y_start: f64,
    pub y_end: f64,
    pub magnification: u64,
    pub iteration_budget: u32,
    pub escape_radius: f64,
    pub width: u32,
    pub height: u32,
}

impl ExportMetadata {
    /// Describe `region` at the budget it last completed.
    pub fn from_region<P>(region: &Region<P>, escape_radius: f64) -> crate::Result<Self> {
        let budget = region.completed_budget().ok_or(RenderError::NotRendered)?;
        let b = region.bounds();
        Ok(Self {
            x_start: b.x_start,
            x_end: b.x_end,
            y_start: b.y_start,
            y_end: b.y_end,
            magnification: region.magnification(),
            iteration_budget: budget,
            escape_radius,
            width: region.width(),
            height: region.height(),
        })
    }
}

/// Bit depth of the exported image for channel type `T`.
///
/// 8-bit channels export as 8-bit PNG; anything wider as 16-bit.
pub fn png_depth<T: Channel>() -> png::BitDepth {
    if T::STORAGE_BITS <= 8 {
        png::BitDepth::Eight
    } else {
        png::BitDepth::Sixteen
    }
}

/// Write an HSV buffer as an RGB PNG file with embedded region metadata.
///
/// Uses the `png` crate directly to inject custom tEXt chunks readable by
/// exiftool, IrfanView, XnView, etc.
pub fn export_png<T: Channel>(
    hsv: &[Hsv<T>],
    hue_range: f64,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let (width, height) = (metadata.width, metadata.height);
    if hsv.len() != width as usize * height as usize {
        return Err(export_error(
            path,
            format!("buffer holds {} pixels, expected {width}×{height}", hsv.len()),
        ));
    }

    let file = std::fs::File::create(path)
        .map_err(|e| export_error(path, format!("failed to create file: {e}")))?;
    let writer = BufWriter::new(file);

    let depth = png_depth::<T>();
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(depth);
    encoder.set_compression(png::Compression::Default);

    encoder
        .add_text_chunk("Software".to_string(), "MellowSim".to_string())
        .map_err(|e| export_error(path, format!("failed to add text chunk: {e}")))?;
    encoder
        .add_text_chunk("Description".to_string(), build_description(metadata))
        .map_err(|e| export_error(path, format!("failed to add text chunk: {e}")))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder
            .add_text_chunk(key.clone(), value)
            .map_err(|e| export_error(path, format!("failed to add text chunk '{key}': {e}")))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| export_error(path, format!("failed to write PNG header: {e}")))?;

    let data = match depth {
        png::BitDepth::Eight => hsv.iter().flat_map(|px| px.to_rgb8(hue_range)).collect(),
        _ => encode_rgb16(hsv, hue_range),
    };
    png_writer
        .write_image_data(&data)
        .map_err(|e| export_error(path, format!("failed to write PNG image data: {e}")))?;

    debug!("Exported PNG {}x{} to {}", width, height, path.display());
    Ok(())
}

/// Big-endian 16-bit RGB samples, as PNG stores them.
fn encode_rgb16<T: Channel>(hsv: &[Hsv<T>], hue_range: f64) -> Vec<u8> {
    let mut data = Vec::with_capacity(hsv.len() * 6);
    for px in hsv {
        for c in px.to_rgb_unit(hue_range) {
            let v = (c.clamp(0.0, 1.0) * u16::MAX as f64).round() as u16;
            data.extend_from_slice(&v.to_be_bytes());
        }
    }
    data
}

fn export_error(path: &Path, reason: String) -> RenderError {
    RenderError::Export {
        path: path.to_path_buf(),
        reason,
    }
}

fn build_description(meta: &ExportMetadata) -> String {
    format!(
        "Mandelbrot - Re: [{}, {}], Im: [{}, {}], Magnification: {}, Iterations: {}",
        meta.x_start, meta.x_end, meta.y_end, meta.y_start, meta.magnification, meta.iteration_budget,
    )
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    vec![
        ("MellowSim.XStart".into(), meta.x_start.to_string()),
        ("MellowSim.XEnd".into(), meta.x_end.to_string()),
        ("MellowSim.YStart".into(), meta.y_start.to_string()),
        ("MellowSim.YEnd".into(), meta.y_end.to_string()),
        ("MellowSim.Magnification".into(), meta.magnification.to_string()),
        ("MellowSim.MaxIterations".into(), meta.iteration_budget.to_string()),
        ("MellowSim.EscapeRadius".into(), meta.escape_radius.to_string()),
        ("MellowSim.Resolution".into(), format!("{}x{}", meta.width, meta.height)),
    ]
}
