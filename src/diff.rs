//! Inspecting a generated QR SVG: its embedded logo and its encoded content.
use std::path::Path;

use crate::error::Result;
use crate::svg::{Element, WriterConfig};

/// Side length used when rendering a code for decoding.
pub const RENDER_SIZE: u32 = 2048;

/// Returns the logo subtree of a generated QR SVG, serialized on its own.
///
/// The logo is the first `<svg>` nested directly under the root. `Ok(None)` if
/// the code has no logo.
pub fn extract_logo(svg: &str) -> Result<Option<String>> {
    let root = Element::parse(svg)?;
    Ok(root
        .find_svg_child("svg")
        .map(|logo| logo.to_xml(&WriterConfig::fragment())))
}

/// Renders the QR SVG at `path` and decodes its payload.
#[cfg(feature = "validate")]
pub fn decode_content(path: &Path) -> Result<String> {
    let image = crate::validate::render_svg(path, RENDER_SIZE, RENDER_SIZE)?;
    crate::validate::decode_qr(&image)
}

/// Renders the QR SVG at `path` and decodes its payload.
#[cfg(not(feature = "validate"))]
pub fn decode_content(path: &Path) -> Result<String> {
    let _ = path;
    Err(crate::error::Error::Decode(
        "Decoding requires the 'validate' feature to be enabled".to_string(),
    ))
}
