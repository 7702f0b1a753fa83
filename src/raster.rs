//! Rasterization and blurring of logo images.
//!
//! Both steps sit behind small traits, [`Rasterize`] and [`Blur`], so the mask
//! code can run against deterministic stand-ins in tests.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use image::RgbaImage;
use log::debug;
use resvg::usvg::fontdb::{Database, Family, Query};
use resvg::{tiny_skia, usvg};

use crate::error::{Error, Result};

/// Renders SVG source to an RGBA raster of an exact size.
pub trait Rasterize {
    fn rasterize(&self, svg: &[u8], width: u32, height: u32) -> Result<RgbaImage>;
}

/// Blurs an RGBA raster.
pub trait Blur {
    fn blur(&self, image: &RgbaImage, radius: f32) -> RgbaImage;
}

/// [`Rasterize`] implementation backed by `resvg`.
///
/// Text is drawn with the system fonts. Relative `href`s in the SVG resolve
/// against `resources_dir`, or the working directory when it is unset.
///
/// The rendered pixmap goes through a PNG temporary file before it is read
/// back, which also converts its premultiplied pixels to straight alpha. The
/// file is removed when the call returns, on success or failure.
#[derive(Clone, Debug, Default)]
pub struct ResvgRasterizer {
    pub resources_dir: Option<PathBuf>,
}

impl ResvgRasterizer {
    /// A rasterizer resolving relative references against `dir`.
    pub fn with_resources_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            resources_dir: Some(dir.into()),
        }
    }

    /// A rasterizer for the SVG file at `path`, resolving against its directory.
    pub fn for_file(path: &Path) -> Self {
        match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            Some(dir) => Self::with_resources_dir(dir),
            None => Self::default(),
        }
    }

    fn options(&self) -> usvg::Options<'static> {
        let mut options = usvg::Options::default();
        options.resources_dir = self.resources_dir.clone();
        options.fontdb = system_fonts();
        options
    }
}

impl Rasterize for ResvgRasterizer {
    fn rasterize(&self, svg: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
        let options = self.options();
        let tree = usvg::Tree::from_data(svg, &options)
            .map_err(|e| Error::Asset(format!("Failed to parse SVG: {}", e)))?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            Error::Asset(format!("Cannot allocate a {}x{} raster", width, height))
        })?;

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let png = pixmap
            .encode_png()
            .map_err(|e| Error::Asset(format!("Failed to encode raster: {}", e)))?;

        let mut tmp = tempfile::Builder::new()
            .prefix("qrsvg-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| Error::Asset(format!("Failed to create temporary file: {}", e)))?;
        tmp.write_all(&png)
            .and_then(|_| tmp.flush())
            .map_err(|e| Error::Asset(format!("Failed to write temporary file: {}", e)))?;

        let image = image::open(tmp.path())
            .map_err(|e| Error::Asset(format!("Failed to read raster back: {}", e)))?
            .to_rgba8();
        debug!("Rasterized SVG to {}x{}", image.width(), image.height());
        Ok(image)
    }
}

/// Renders the SVG file at `path` to exactly `width` by `height` pixels.
pub fn rasterize_svg(path: &Path, width: u32, height: u32) -> Result<RgbaImage> {
    let data = std::fs::read(path)
        .map_err(|e| Error::Asset(format!("Cannot read {}: {}", path.display(), e)))?;
    ResvgRasterizer::for_file(path).rasterize(&data, width, height)
}

/// System fonts, loaded once per process.
///
/// usvg falls back to the generic serif family when a `font-family` is not
/// installed. If the generic families name fonts that are missing too, they
/// are pointed at the first installed face so text still renders.
pub fn system_fonts() -> Arc<Database> {
    static FONTS: OnceLock<Arc<Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            let fallback = db
                .faces()
                .next()
                .and_then(|face| face.families.first())
                .map(|(name, _)| name.clone());
            if let Some(name) = fallback {
                if !resolves(&db, Family::SansSerif) {
                    db.set_sans_serif_family(name.clone());
                }
                if !resolves(&db, Family::Serif) {
                    db.set_serif_family(name);
                }
            }
            debug!("Loaded {} system font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

fn resolves(db: &Database, family: Family<'_>) -> bool {
    let families = [family];
    db.query(&Query {
        families: &families,
        ..Query::default()
    })
    .is_some()
}

/// Gaussian blur from `image::imageops`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianBlur;

impl Blur for GaussianBlur {
    fn blur(&self, image: &RgbaImage, radius: f32) -> RgbaImage {
        if !(radius > 0.0 && radius.is_finite()) {
            return image.clone();
        }
        image::imageops::blur(image, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">
  <rect x="0" y="0" width="5" height="10" fill="#000"/>
</svg>"##;

    fn painted(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_rasterize_has_requested_size() {
        let img = ResvgRasterizer::default().rasterize(SQUARE.as_bytes(), 40, 20).unwrap();
        assert_eq!(img.dimensions(), (40, 20));
    }

    #[test]
    fn test_rasterize_scales_content() {
        let img = ResvgRasterizer::default().rasterize(SQUARE.as_bytes(), 40, 40).unwrap();
        // Left half is opaque black, right half fully transparent.
        assert_eq!(img.get_pixel(5, 20).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(35, 20).0[3], 0);
    }

    #[test]
    fn test_rasterize_rejects_bad_input() {
        assert!(matches!(ResvgRasterizer::default().rasterize(b"not svg", 10, 10), Err(Error::Asset(_))));
        assert!(matches!(ResvgRasterizer::default().rasterize(SQUARE.as_bytes(), 0, 10), Err(Error::Asset(_))));
    }

    #[test]
    fn test_rasterize_missing_file() {
        let result = rasterize_svg(Path::new("/nonexistent/logo.svg"), 10, 10);
        assert!(matches!(result, Err(Error::Asset(_))));
    }

    #[test]
    fn test_rasterize_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.svg");
        std::fs::write(&path, SQUARE).unwrap();
        let img = rasterize_svg(&path, 16, 16).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
    }

    #[test]
    fn test_zero_radius_blur_is_identity() {
        let img = ResvgRasterizer::default().rasterize(SQUARE.as_bytes(), 8, 8).unwrap();
        assert_eq!(GaussianBlur.blur(&img, 0.0), img);
        assert_eq!(GaussianBlur.blur(&img, f32::NAN), img);
    }

    #[test]
    fn test_blur_softens_edges() {
        let img = ResvgRasterizer::default().rasterize(SQUARE.as_bytes(), 20, 20).unwrap();
        let blurred = GaussianBlur.blur(&img, 2.0);
        assert_eq!(blurred.dimensions(), img.dimensions());
        let edge = blurred.get_pixel(10, 10).0[3];
        assert!(edge > 0 && edge < 255, "edge alpha {}", edge);
    }

    #[test]
    fn test_rasterize_text_logo() {
        if system_fonts().faces().next().is_none() {
            return;
        }
        let logo = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 40 20">
  <text x="2" y="16" font-size="16" font-weight="bold">LOGO</text>
</svg>"#;
        let img = ResvgRasterizer::default().rasterize(logo, 80, 40).unwrap();
        assert!(painted(&img) > 0);
    }

    #[test]
    fn test_relative_image_resolves_against_resources_dir() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 4, image::Rgba([200, 0, 0, 255]))
            .save(dir.path().join("dot.png"))
            .unwrap();
        let logo = br#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 10 10">
  <image width="10" height="10" xlink:href="dot.png"/>
</svg>"#;

        let img = ResvgRasterizer::with_resources_dir(dir.path())
            .rasterize(logo, 10, 10)
            .unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [200, 0, 0, 255]);

        let path = dir.path().join("logo.svg");
        std::fs::write(&path, logo).unwrap();
        let img = rasterize_svg(&path, 10, 10).unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [200, 0, 0, 255]);
    }
}
