//! Sticker export
//!
//! Writes working artwork to disk as PNG, upscaling for the print-quality
//! preset.

use std::{
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use image::{ImageFormat, imageops::FilterType};
use thiserror::Error;

/// Export quality preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DpiPreset {
    /// Screen quality, exported at native size.
    #[default]
    Screen72,
    /// Print quality, upscaled 2x.
    Print300,
}

impl DpiPreset {
    /// Upscale factor applied on export.
    #[must_use]
    pub fn scale_factor(self) -> u32 {
        match self {
            DpiPreset::Screen72 => 1,
            DpiPreset::Print300 => 2,
        }
    }

    /// DPI label used in the exported file name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DpiPreset::Screen72 => "72",
            DpiPreset::Print300 => "300",
        }
    }
}

impl FromStr for DpiPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "72" => Ok(DpiPreset::Screen72),
            "300" => Ok(DpiPreset::Print300),
            other => Err(format!("unknown DPI preset {other:?}; expected 72 or 300")),
        }
    }
}

/// Errors from exporting artwork.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The artwork bytes could not be decoded or re-encoded.
    #[error("image processing failed")]
    Image(#[from] image::ImageError),

    /// The output file could not be written.
    #[error("failed to write output file")]
    Io(#[from] io::Error),
}

/// Map a display name to a safe file stem: anything outside `[a-z0-9]`
/// becomes `_`, and a blank name falls back to `my-sticker`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let trimmed = name.trim();
    let base = if trimmed.is_empty() { "my-sticker" } else { trimmed };

    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Export encoded image bytes as `{name}-{dpi}dpi.png` in `dir`.
///
/// The print preset upscales the artwork 2x for better print results.
///
/// # Errors
///
/// Returns an error when the bytes cannot be decoded as an image or the
/// output file cannot be written.
pub fn export_png(
    bytes: &[u8],
    name: &str,
    dpi: DpiPreset,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let decoded = image::load_from_memory(bytes)?;

    let scale = dpi.scale_factor();
    let scaled = if scale > 1 {
        decoded.resize(
            decoded.width() * scale,
            decoded.height() * scale,
            FilterType::CatmullRom,
        )
    } else {
        decoded
    };

    let path = dir.join(format!("{}-{}dpi.png", sanitize_name(name), dpi.label()));

    scaled.save_with_format(&path, ImageFormat::Png)?;

    Ok(path)
}
