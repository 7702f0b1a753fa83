//! Logo masking: deciding which QR dots the logo hides.
//!
//! The logo is rasterized at one pixel per drawing unit, blurred, and collapsed
//! to a single intensity per pixel by summing its channels. Transparent pixels
//! sum to roughly zero whatever their colour, so only the parts of the logo
//! that actually paint something push dots out. The raster is placed into a
//! zero grid the size of the whole QR drawing and every dot whose cell passes
//! the [`Threshold`] is removed.
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::raster::{Blur, Rasterize};
use crate::svg::Element;
use crate::units::{Offset, Size, Unit};

/// Which cells count as covered by the logo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Threshold {
    /// Painted cells at least as bright as the mean of the logo raster.
    ///
    /// Depends only on the logo, so the blurred fringe around a solid logo is
    /// left alone and the cleared area stays close to the logo's outline.
    #[default]
    Footprint,
    /// Cells brighter than the mean of the whole mask, background included.
    ///
    /// The mean falls as the code grows, so the blurred fringe is cleared too.
    /// On small codes with a solid logo this can clear more modules than the
    /// error correction can recover.
    Mask,
}

impl Threshold {
    pub const ALL: [Threshold; 2] = [Threshold::Footprint, Threshold::Mask];

    pub fn name(self) -> &'static str {
        match self {
            Threshold::Footprint => "footprint",
            Threshold::Mask => "mask",
        }
    }
}

impl FromStr for Threshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Threshold::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::InvalidArgument(format!("Unknown threshold `{}`, expected footprint or mask", s))
            })
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where and how to rasterize the logo for masking.
#[derive(Clone, Copy, Debug)]
pub struct MaskSpec {
    /// Logo footprint in drawing units.
    pub footprint: Size,
    /// Top-left corner of the footprint in drawing units.
    pub offset: Offset,
    /// Gaussian blur radius in pixels.
    pub blur: f32,
    /// Extra pixels on every side of the footprint.
    pub margin: u32,
    pub threshold: Threshold,
}

/// Intensity grid covering the whole QR drawing, one cell per drawing unit.
#[derive(Clone, PartialEq, Debug)]
pub struct LogoMask {
    width: usize,
    height: usize,
    cells: Vec<f32>,
    threshold: Threshold,
    footprint_mean: f32,
}

impl LogoMask {
    /// An all-zero mask.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
            threshold: Threshold::default(),
            footprint_mean: 0.0,
        }
    }

    /// Rasterizes `logo` per `spec` and places it into a mask sized for `drawing`.
    pub fn build<R, B>(
        drawing: Size,
        logo: &[u8],
        spec: &MaskSpec,
        rasterizer: &R,
        blur: &B,
    ) -> Result<Self>
    where
        R: Rasterize + ?Sized,
        B: Blur + ?Sized,
    {
        let margin = spec.margin;
        let limit = cells(drawing.max_side());
        if i64::from(margin) > limit {
            return Err(Error::InvalidArgument(format!(
                "Logo margin {} is larger than the QR drawing ({})",
                margin, limit
            )));
        }
        let raster_w = padded(spec.footprint.width, margin)?;
        let raster_h = padded(spec.footprint.height, margin)?;

        let raster = rasterizer.rasterize(logo, raster_w, raster_h)?;
        let blurred = blur.blur(&raster, spec.blur);

        let (w, h) = blurred.dimensions();
        let intensity: Vec<f32> = blurred
            .pixels()
            .map(|p| p.0.iter().map(|&c| c as f32).sum())
            .collect();

        let mut mask = LogoMask::zeros(cells(drawing.width) as usize, cells(drawing.height) as usize);
        mask.threshold = spec.threshold;
        mask.footprint_mean = mean(&intensity);
        let left = cells(spec.offset.x) - margin as i64;
        let top = cells(spec.offset.y) - margin as i64;
        debug!(
            "Placing {}x{} logo raster at ({}, {}) in {}x{} mask",
            w, h, left, top, mask.width, mask.height
        );
        mask.paste(&intensity, w as usize, h as usize, left, top);
        Ok(mask)
    }

    /// Writes a `w` by `h` row-major block at (`left`, `top`), clipped to the mask.
    pub fn paste(&mut self, block: &[f32], w: usize, h: usize, left: i64, top: i64) {
        let mut clipped = false;
        for row in 0..h {
            let y = top + row as i64;
            if y < 0 || y >= self.height as i64 {
                clipped = true;
                continue;
            }
            for col in 0..w {
                let x = left + col as i64;
                if x < 0 || x >= self.width as i64 {
                    clipped = true;
                    continue;
                }
                self.cells[y as usize * self.width + x as usize] = block[row * w + col];
            }
        }
        if clipped {
            warn!("Logo mask placement at ({}, {}) was clipped to the QR bounds", left, top);
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Intensity at (`row`, `col`), or `None` outside the mask.
    pub fn get(&self, row: i64, col: i64) -> Option<f32> {
        if row < 0 || col < 0 || row >= self.height as i64 || col >= self.width as i64 {
            return None;
        }
        Some(self.cells[row as usize * self.width + col as usize])
    }

    /// Mean over every cell, background included.
    pub fn mean(&self) -> f32 {
        mean(&self.cells)
    }

    /// Mean over the logo raster as it was built, before placement.
    pub fn footprint_mean(&self) -> f32 {
        self.footprint_mean
    }

    /// Removes every root-level `<circle>` of `tree` whose cell the logo covers.
    ///
    /// Dot centres are read in millimetres and looked up one cell up and to the
    /// left of the cell they fall in. Returns the number of dots removed.
    pub fn apply(&self, tree: &mut Element) -> usize {
        let mask_mean = self.mean();
        let covered = |value: f32| match self.threshold {
            Threshold::Footprint => value > 0.0 && value >= self.footprint_mean,
            Threshold::Mask => value > mask_mean,
        };
        let removed = tree.retain_elements(|element| {
            if !element.is_svg("circle") {
                return true;
            }
            let cx = element.attr("cx").unwrap_or_default();
            let cy = element.attr("cy").unwrap_or_default();
            let Ok(center) = Size::from_strings(cx, cy, Unit::Mm) else {
                return true;
            };
            let row = cells(center.height - 1.0);
            let col = cells(center.width - 1.0);
            !matches!(self.get(row, col), Some(value) if covered(value))
        });
        debug!(
            "Threshold {} (mask mean {:.3}, footprint mean {:.3}); removed {} dots",
            self.threshold, mask_mean, self.footprint_mean, removed
        );
        removed
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().map(|&c| c as f64).sum();
    (total / values.len() as f64) as f32
}

/// Raster side for a footprint side plus `margin` on both ends.
fn padded(length: f64, margin: u32) -> Result<u32> {
    u32::try_from(cells(length))
        .ok()
        .and_then(|side| margin.checked_mul(2)?.checked_add(side))
        .ok_or_else(|| Error::InvalidArgument(format!("Logo raster side {} + 2 x {} is out of range", length, margin)))
}

/// Truncates toward zero, absorbing the rounding left by unit round trips.
fn cells(value: f64) -> i64 {
    (value + value.signum() * 1e-6).trunc() as i64
}
