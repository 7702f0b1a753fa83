//! The [`Qr`] composer: a QR drawing plus an optional centred logo.
use std::path::Path;

use log::{debug, info};

use crate::encoder::{CorrectionLevel, Encode, QrEncoder};
use crate::error::{Error, Result};
use crate::mask::{LogoMask, MaskSpec, Threshold};
use crate::raster::{Blur, GaussianBlur, Rasterize, ResvgRasterizer};
use crate::svg::{Element, WriterConfig};
use crate::units::{Offset, Size, Unit, ViewBox};

/// Unit of every length written into the drawing.
pub const UNIT: Unit = Unit::Mm;

/// How a logo is sized, masked and nudged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogoOptions {
    /// Larger logo side as a fraction of the larger QR side, in `(0, 1]`.
    pub scale: f64,
    /// Blur radius applied to the logo raster before masking.
    pub blur: f32,
    /// Pixels added around the logo raster, widening the cleared area.
    pub margin: u32,
    /// Manual correction added to the logo position only, not to the mask.
    pub offset: Offset,
    /// How covered dots are picked from the logo mask.
    pub threshold: Threshold,
}

impl Default for LogoOptions {
    fn default() -> Self {
        Self {
            scale: 0.3,
            blur: 1.0,
            margin: 0,
            offset: Offset::default(),
            threshold: Threshold::default(),
        }
    }
}

/// A QR code drawing that owns its SVG tree.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use qrsvg::{CorrectionLevel, LogoOptions, Qr};
///
/// let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
/// qr.add_logo(Path::new("logo.svg"), &LogoOptions::default()).unwrap();
/// qr.save(Path::new("output.svg")).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Qr {
    data: String,
    tree: Element,
    size: Size,
}

impl Qr {
    /// Encodes `data` with the default [`QrEncoder`].
    pub fn new(data: impl Into<String>, level: CorrectionLevel) -> Result<Self> {
        Self::with_encoder(data, level, &QrEncoder::default())
    }

    /// Encodes `data` with `encoder`.
    pub fn with_encoder<E>(data: impl Into<String>, level: CorrectionLevel, encoder: &E) -> Result<Self>
    where
        E: Encode + ?Sized,
    {
        let data = data.into();
        let tree = encoder.encode(&data, level)?;
        let size = drawing_size(&tree)?;
        Ok(Self { data, tree, size })
    }

    /// The encoded payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Drawing size in [`UNIT`].
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn tree(&self) -> &Element {
        &self.tree
    }

    /// Number of QR dots currently in the drawing.
    pub fn dot_count(&self) -> usize {
        self.tree.elements().filter(|e| e.is_svg("circle")).count()
    }

    /// Adds the SVG logo at `logo` to the centre of the code.
    ///
    /// Relative references inside the logo resolve against its directory.
    pub fn add_logo(&mut self, logo: &Path, options: &LogoOptions) -> Result<()> {
        let text = std::fs::read_to_string(logo)
            .map_err(|e| Error::Asset(format!("Cannot read {}: {}", logo.display(), e)))?;
        self.add_logo_svg(&text, options, &ResvgRasterizer::for_file(logo), &GaussianBlur)
    }

    /// Adds a logo given as SVG source, using the supplied raster backends.
    ///
    /// Dots under the logo are removed first, then the logo's root element is
    /// appended with `x`, `y`, `width` and `height` set to its placement.
    ///
    /// # Errors
    ///
    /// [`Error::Asset`] if the logo cannot be parsed or rendered, or carries
    /// neither usable `width`/`height` nor a `viewBox`. [`Error::InvalidArgument`]
    /// for a scale outside `(0, 1]`, a negative or non-finite blur, or a margin
    /// wider than the code.
    pub fn add_logo_svg<R, B>(&mut self, svg: &str, options: &LogoOptions, rasterizer: &R, blur: &B) -> Result<()>
    where
        R: Rasterize + ?Sized,
        B: Blur + ?Sized,
    {
        if !(options.scale > 0.0 && options.scale <= 1.0) {
            return Err(Error::InvalidArgument(format!(
                "Logo scale must be in (0, 1], got {}",
                options.scale
            )));
        }
        if !(options.blur.is_finite() && options.blur >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "Blur radius must be a non-negative number, got {}",
                options.blur
            )));
        }

        let mut root = Element::parse(svg)?;
        let size = self.logo_size(&root, options.scale)?;
        let offset = Offset::new(
            (self.size.width - size.width) / 2.0,
            (self.size.height - size.height) / 2.0,
        );
        debug!(
            "Logo footprint {:.3}x{:.3}{} at ({:.3}, {:.3})",
            size.width, size.height, UNIT, offset.x, offset.y
        );

        let spec = MaskSpec {
            footprint: size,
            offset,
            blur: options.blur,
            margin: options.margin,
            threshold: options.threshold,
        };
        let mask = LogoMask::build(self.size, svg.as_bytes(), &spec, rasterizer, blur)?;
        mask.apply(&mut self.tree);

        root.set_attr("width", format!("{}{}", size.width, UNIT));
        root.set_attr("x", format!("{}{}", offset.x + options.offset.x, UNIT));
        root.set_attr("height", format!("{}{}", size.height, UNIT));
        root.set_attr("y", format!("{}{}", offset.y + options.offset.y, UNIT));
        self.tree.push(root);
        Ok(())
    }

    /// Natural logo size scaled so its larger side is `scale` of the code's.
    fn logo_size(&self, node: &Element, scale: f64) -> Result<Size> {
        let explicit = match (node.attr("width"), node.attr("height")) {
            (Some(w), Some(h)) => Some(Size::from_strings(w, h, UNIT)?),
            _ => None,
        };

        let natural = match explicit.filter(|s| s.width > 0.0 && s.height > 0.0) {
            Some(size) => size,
            None => {
                let viewbox = node
                    .attr("viewBox")
                    .and_then(ViewBox::parse)
                    .ok_or_else(|| Error::Asset("No size information found in the SVG file".to_string()))?;
                Size::new(viewbox.width, viewbox.height, UNIT)
            }
        };

        let fit = self.size.max_side() / natural.max_side();
        Ok(Size::new(
            scale * fit * natural.width,
            scale * fit * natural.height,
            UNIT,
        ))
    }

    /// The full SVG document, XML declaration included.
    pub fn to_svg_string(&self) -> String {
        self.tree.to_xml(&WriterConfig::svg())
    }

    /// Writes the SVG document to `output`.
    pub fn save(&self, output: &Path) -> Result<()> {
        std::fs::write(output, self.to_svg_string())?;
        info!("Saved QR code to {}", output.display());
        Ok(())
    }
}

fn drawing_size(tree: &Element) -> Result<Size> {
    let width = tree
        .attr("width")
        .ok_or_else(|| Error::Format("QR drawing has no width".to_string()))?;
    let height = tree
        .attr("height")
        .ok_or_else(|| Error::Format("QR drawing has no height".to_string()))?;
    Size::from_strings(width, height, UNIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::QName;
    use image::{Rgba, RgbaImage};

    const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 10">
  <rect width="20" height="10" rx="2" fill="#d22"/>
</svg>"##;

    /// Solid dark disc filling its square viewBox.
    const DISC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
  <circle cx="5" cy="5" r="5" fill="#123"/>
</svg>"##;

    struct Opaque;

    impl Rasterize for Opaque {
        fn rasterize(&self, _svg: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
        }
    }

    struct Sharp;

    impl Blur for Sharp {
        fn blur(&self, image: &RgbaImage, _radius: f32) -> RgbaImage {
            image.clone()
        }
    }

    /// Fixed 10x10 drawing with a dot in every module.
    struct GridEncoder;

    impl Encode for GridEncoder {
        fn encode(&self, _payload: &str, _level: CorrectionLevel) -> Result<Element> {
            let mut root = Element::new(QName::svg("svg"))
                .with_attr("width", "10mm")
                .with_attr("height", "10mm");
            for y in 0..10 {
                for x in 0..10 {
                    root.push(
                        Element::new(QName::svg("circle"))
                            .with_attr("cx", format!("{}.5mm", x))
                            .with_attr("cy", format!("{}.5mm", y))
                            .with_attr("r", "0.5mm"),
                    );
                }
            }
            Ok(root)
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_new_reads_drawing_size() {
        let qr = Qr::new("HELLO WORLD", CorrectionLevel::L).unwrap();
        assert!(close(qr.size().width, 29.0));
        assert!(close(qr.size().height, 29.0));
        assert_eq!(qr.data(), "HELLO WORLD");
        assert!(qr.dot_count() > 0);
    }

    #[test]
    fn test_logo_is_centred_and_scaled() {
        let mut qr = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        let options = LogoOptions { scale: 0.4, margin: 0, ..LogoOptions::default() };
        qr.add_logo_svg(LOGO, &options, &Opaque, &Sharp).unwrap();

        let logo = qr.tree().find_svg_child("svg").unwrap();
        assert_eq!(logo.attr("width"), Some("4mm"));
        assert_eq!(logo.attr("height"), Some("2mm"));
        assert_eq!(logo.attr("x"), Some("3mm"));
        assert_eq!(logo.attr("y"), Some("4mm"));
        assert_eq!(logo.attr("viewBox"), Some("0 0 20 10"));
    }

    #[test]
    fn test_logo_removes_dots_beneath_it() {
        let mut qr = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        let options = LogoOptions { scale: 0.4, margin: 0, ..LogoOptions::default() };
        qr.add_logo_svg(LOGO, &options, &Opaque, &Sharp).unwrap();

        // 4x2 block at (3, 4); dot (x, y) looks up cell (y - 1, x - 1).
        assert_eq!(qr.dot_count(), 100 - 8);
        let remaining: Vec<(&str, &str)> = qr
            .tree()
            .elements()
            .filter(|e| e.is_svg("circle"))
            .map(|e| (e.attr("cx").unwrap(), e.attr("cy").unwrap()))
            .collect();
        assert!(!remaining.contains(&("4.5mm", "5.5mm")));
        assert!(!remaining.contains(&("7.5mm", "6.5mm")));
        assert!(remaining.contains(&("3.5mm", "5.5mm")));
        assert!(remaining.contains(&("4.5mm", "4.5mm")));
    }

    #[test]
    fn test_correction_offset_moves_logo_not_mask() {
        let options = LogoOptions { scale: 0.4, ..LogoOptions::default() };
        let mut plain = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        plain.add_logo_svg(LOGO, &options, &Opaque, &Sharp).unwrap();

        let shifted_options = LogoOptions { offset: Offset::new(1.5, -0.5), ..options };
        let mut shifted = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        shifted.add_logo_svg(LOGO, &shifted_options, &Opaque, &Sharp).unwrap();

        let logo = shifted.tree().find_svg_child("svg").unwrap();
        assert_eq!(logo.attr("x"), Some("4.5mm"));
        assert_eq!(logo.attr("y"), Some("3.5mm"));
        assert_eq!(plain.dot_count(), shifted.dot_count());
    }

    #[test]
    fn test_explicit_size_wins_over_viewbox() {
        let logo = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10mm" height="40mm" viewBox="0 0 20 10"/>"#;
        let mut qr = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        let options = LogoOptions { scale: 0.5, ..LogoOptions::default() };
        qr.add_logo_svg(logo, &options, &Opaque, &Sharp).unwrap();

        let placed = qr.tree().find_svg_child("svg").unwrap();
        assert_eq!(placed.attr("width"), Some("1.25mm"));
        assert_eq!(placed.attr("height"), Some("5mm"));
    }

    #[test]
    fn test_missing_size_information_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.svg");
        let output = dir.path().join("out.svg");
        std::fs::write(&logo, r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/></svg>"#).unwrap();

        let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        let before = qr.dot_count();
        let result = qr.add_logo(&logo, &LogoOptions::default());
        assert!(matches!(result, Err(Error::Asset(ref m)) if m.contains("No size information")));
        assert_eq!(qr.dot_count(), before);
        assert!(!output.exists());
    }

    #[test]
    fn test_unreadable_logo_is_asset_error() {
        let mut qr = Qr::new("HELLO", CorrectionLevel::L).unwrap();
        let result = qr.add_logo(Path::new("/nonexistent/logo.svg"), &LogoOptions::default());
        assert!(matches!(result, Err(Error::Asset(_))));
    }

    #[test]
    fn test_scale_out_of_range() {
        let mut qr = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        for scale in [0.0, -0.2, 1.5, f64::NAN] {
            let options = LogoOptions { scale, ..LogoOptions::default() };
            let result = qr.add_logo_svg(LOGO, &options, &Opaque, &Sharp);
            assert!(matches!(result, Err(Error::InvalidArgument(_))), "scale {}", scale);
        }
    }

    #[test]
    fn test_blur_must_be_finite_and_non_negative() {
        let mut qr = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        for blur in [f32::NAN, f32::INFINITY, -1.0] {
            let options = LogoOptions { blur, ..LogoOptions::default() };
            let result = qr.add_logo_svg(LOGO, &options, &Opaque, &Sharp);
            assert!(matches!(result, Err(Error::InvalidArgument(_))), "blur {}", blur);
        }
        assert_eq!(qr.dot_count(), 100);
        let options = LogoOptions { blur: 0.0, ..LogoOptions::default() };
        assert!(qr.add_logo_svg(LOGO, &options, &Opaque, &Sharp).is_ok());
    }

    #[test]
    fn test_margin_wider_than_code_is_rejected() {
        let mut qr = Qr::with_encoder("x", CorrectionLevel::H, &GridEncoder).unwrap();
        for margin in [11, u32::MAX] {
            let options = LogoOptions { margin, ..LogoOptions::default() };
            let result = qr.add_logo_svg(LOGO, &options, &Opaque, &Sharp);
            assert!(matches!(result, Err(Error::InvalidArgument(_))), "margin {}", margin);
        }
        assert!(qr.tree().find_svg_child("svg").is_none());
    }

    #[test]
    fn test_text_logo_removes_dots() {
        if crate::raster::system_fonts().faces().next().is_none() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.svg");
        std::fs::write(
            &logo,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 40 20"><text x="2" y="16" font-size="16" font-weight="bold">LOGO</text></svg>"#,
        )
        .unwrap();

        let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        let before = qr.dot_count();
        qr.add_logo(&logo, &LogoOptions::default()).unwrap();
        assert!(qr.dot_count() < before);
    }

    #[test]
    fn test_logo_images_resolve_next_to_logo_file() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]))
            .save(dir.path().join("mark.png"))
            .unwrap();
        let logo = dir.path().join("logo.svg");
        std::fs::write(
            &logo,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 10 10"><image width="10" height="10" xlink:href="mark.png"/></svg>"#,
        )
        .unwrap();

        let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        let before = qr.dot_count();
        qr.add_logo(&logo, &LogoOptions::default()).unwrap();
        assert!(qr.dot_count() < before);
    }

    #[test]
    fn test_mask_threshold_clears_more_than_footprint() {
        let options = LogoOptions { margin: 1, ..LogoOptions::default() };
        let mut footprint = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        footprint.add_logo_svg(DISC, &options, &ResvgRasterizer::default(), &GaussianBlur).unwrap();

        let whole = LogoOptions { threshold: Threshold::Mask, ..options };
        let mut mask = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        mask.add_logo_svg(DISC, &whole, &ResvgRasterizer::default(), &GaussianBlur).unwrap();

        assert!(mask.dot_count() < footprint.dot_count());
    }

    #[test]
    fn test_adding_logo_never_adds_dots() {
        let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        let before = qr.dot_count();
        qr.add_logo_svg(LOGO, &LogoOptions::default(), &ResvgRasterizer::default(), &GaussianBlur).unwrap();
        assert!(qr.dot_count() <= before);
        assert!(qr.dot_count() < before);
    }

    #[test]
    fn test_save_writes_declaration_and_logo() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("qr.svg");
        let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        qr.add_logo_svg(LOGO, &LogoOptions::default(), &ResvgRasterizer::default(), &GaussianBlur).unwrap();
        qr.save(&output).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("<?xml version='1.0' encoding='utf-8'?>\n<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert_eq!(text.matches("xmlns=").count(), 1);
        assert!(text.contains("<svg viewBox=\"0 0 20 10\""));
        let reparsed = Element::parse(&text).unwrap();
        assert_eq!(reparsed.find_svg_child("svg").map(|e| e.attr("x").is_some()), Some(true));
    }

    #[cfg(feature = "validate")]
    #[test]
    fn test_logo_code_still_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("url.svg");
        let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
        let options = LogoOptions { scale: 0.3, blur: 1.0, margin: 1, ..LogoOptions::default() };
        qr.add_logo_svg(LOGO, &options, &ResvgRasterizer::default(), &GaussianBlur).unwrap();
        qr.save(&output).unwrap();

        let image = crate::validate::render_svg(&output, 2048, 2048).unwrap();
        assert_eq!(crate::validate::decode_qr(&image).unwrap(), "https://example.com");
    }

    #[cfg(feature = "validate")]
    #[test]
    fn test_dark_square_logo_still_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("disc.svg");
        for margin in [0, 1] {
            let mut qr = Qr::new("https://example.com", CorrectionLevel::H).unwrap();
            let options = LogoOptions { scale: 0.3, blur: 1.0, margin, ..LogoOptions::default() };
            qr.add_logo_svg(DISC, &options, &ResvgRasterizer::default(), &GaussianBlur).unwrap();
            qr.save(&output).unwrap();

            for side in [1024, 2048] {
                let image = crate::validate::render_svg(&output, side, side).unwrap();
                let decoded = crate::validate::decode_qr(&image);
                assert_eq!(decoded.ok().as_deref(), Some("https://example.com"), "margin {} at {}px", margin, side);
            }
        }
    }
}
