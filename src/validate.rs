//! Reading generated codes back, for tests and audits.
//!
//! Not used on the generation path. Circular dots only touch their neighbours
//! at a single point, which leaves finder patterns as rings of separate blobs,
//! so when a plain decode fails the image is binarized and its dark regions
//! grown until neighbouring dots merge.
use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgba};
use imageproc::distance_transform::Norm;
use log::debug;

use crate::error::{Error, Result};
use crate::raster::rasterize_svg;

/// Renders the SVG file at `path` to a `width` by `height` image.
pub fn render_svg(path: &Path, width: u32, height: u32) -> Result<DynamicImage> {
    Ok(DynamicImage::ImageRgba8(rasterize_svg(path, width, height)?))
}

/// Decodes the QR code in `image` and returns its payload.
///
/// Fully transparent pixels are treated as white.
pub fn decode_qr(image: &DynamicImage) -> Result<String> {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        if pixel.0[3] == 0 {
            *pixel = Rgba([255, 255, 255, 255]);
        }
    }
    let gray = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()).to_luma8();

    if let Some(content) = detect(gray.clone()) {
        return Ok(content);
    }

    let binary = binarize(&gray);
    let side = gray.width().min(gray.height());
    for divisor in [512, 256, 128, 96, 64] {
        let radius = (side / divisor).clamp(1, u8::MAX as u32) as u8;
        debug!("Retrying decode with dark regions grown by {} px", radius);
        let grown = imageproc::morphology::erode(&binary, Norm::LInf, radius);
        if let Some(content) = detect(grown) {
            return Ok(content);
        }
    }

    Err(Error::Decode("No readable QR code found".to_string()))
}

fn detect(gray: GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare(gray);
    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| grid.decode().ok().map(|(_meta, content)| content))
}

/// Black below mid-grey, white otherwise.
fn binarize(gray: &GrayImage) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] < 128 {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::CorrectionLevel;
    use crate::qr::Qr;
    use crate::vcard::VCard;

    fn round_trip(payload: &str, level: CorrectionLevel) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr.svg");
        Qr::new(payload, level).unwrap().save(&path).unwrap();
        decode_qr(&render_svg(&path, 1024, 1024).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip_every_level() {
        for level in CorrectionLevel::ALL {
            assert_eq!(round_trip("https://example.com", level), "https://example.com");
        }
    }

    #[test]
    fn test_round_trip_vcard() {
        let mut card = VCard::new("Forest", "Gump");
        card.add_email("f@example.com").add_work_phone("(800) 555-1212");
        let text = card.to_string();
        assert_eq!(round_trip(&text, CorrectionLevel::M), text);
    }

    #[test]
    fn test_blank_image_has_no_code() {
        let blank = DynamicImage::ImageRgba8(image::RgbaImage::new(64, 64));
        assert!(matches!(decode_qr(&blank), Err(Error::Decode(_))));
    }

    #[test]
    fn test_binarize_threshold() {
        let gray = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 127 } else { 128 }]));
        let binary = binarize(&gray);
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
        assert_eq!(binary.get_pixel(1, 0).0[0], 255);
    }
}
