//! QR symbol encoding into an SVG tree of circular dots.
//!
//! The symbol itself comes from the `qrcode` crate. This module only turns the
//! module matrix into drawing elements: one `<circle>` per dark module, one
//! module per millimetre, with a quiet-zone border around the symbol.
use std::fmt;
use std::str::FromStr;

use log::debug;
use qrcode::{Color, EcLevel, QrCode};

use crate::error::{Error, Result};
use crate::svg::{Element, QName};

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum CorrectionLevel {
    /// Tolerates ~7% erroneous codewords.
    L,
    /// Tolerates ~15% erroneous codewords.
    M,
    /// Tolerates ~25% erroneous codewords.
    Q,
    /// Tolerates ~30% erroneous codewords.
    #[default]
    H,
}

impl CorrectionLevel {
    pub const ALL: [CorrectionLevel; 4] = [
        CorrectionLevel::L,
        CorrectionLevel::M,
        CorrectionLevel::Q,
        CorrectionLevel::H,
    ];

    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    pub fn ordinal(self) -> usize {
        use CorrectionLevel::*;
        match self {
            L => 0,
            M => 1,
            Q => 2,
            H => 3,
        }
    }

    fn ec_level(self) -> EcLevel {
        use CorrectionLevel::*;
        match self {
            L => EcLevel::L,
            M => EcLevel::M,
            Q => EcLevel::Q,
            H => EcLevel::H,
        }
    }
}

impl FromStr for CorrectionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(CorrectionLevel::L),
            "M" => Ok(CorrectionLevel::M),
            "Q" => Ok(CorrectionLevel::Q),
            "H" => Ok(CorrectionLevel::H),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown error correction level: {} (expected one of L, M, Q, H)",
                s
            ))),
        }
    }
}

impl fmt::Display for CorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            CorrectionLevel::L => "L",
            CorrectionLevel::M => "M",
            CorrectionLevel::Q => "Q",
            CorrectionLevel::H => "H",
        };
        f.write_str(letter)
    }
}

/// Turns payload text into a QR drawing tree.
pub trait Encode {
    fn encode(&self, payload: &str, level: CorrectionLevel) -> Result<Element>;
}

/// Default encoder backed by the `qrcode` crate.
///
/// Produces an `<svg>` root whose `width` and `height` are in millimetres and
/// whose dark modules are `<circle>` children centred on their module.
#[derive(Clone, Copy, Debug)]
pub struct QrEncoder {
    /// Quiet zone in modules on every side.
    pub border: u32,
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self { border: 4 }
    }
}

impl Encode for QrEncoder {
    fn encode(&self, payload: &str, level: CorrectionLevel) -> Result<Element> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), level.ec_level())?;
        debug!(
            "Encoded {} bytes at level {} as {:?} ({} modules)",
            payload.len(),
            level,
            code.version(),
            code.width()
        );
        Ok(to_svg_tree(&code, self.border))
    }
}

/// Builds the circle-dot drawing for `code` with `border` modules of margin.
pub fn to_svg_tree(code: &QrCode, border: u32) -> Element {
    let size = code.width();
    let border = border as usize;
    let dimension = size + 2 * border;

    let mut root = Element::new(QName::svg("svg"))
        .with_attr("width", format!("{}mm", dimension))
        .with_attr("height", format!("{}mm", dimension))
        .with_attr("version", "1.1");

    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let (x, y) = (i % size, i / size);
        let cx = (x + border) as f64 + 0.5;
        let cy = (y + border) as f64 + 0.5;
        root.push(
            Element::new(QName::svg("circle"))
                .with_attr("cx", format!("{}mm", cx))
                .with_attr("cy", format!("{}mm", cy))
                .with_attr("r", "0.5mm"),
        );
    }

    root
}

/// Encodes `payload` with the default [`QrEncoder`].
///
/// # Example
///
/// ```rust
/// use qrsvg::encoder::{encode_qr, CorrectionLevel};
///
/// let tree = encode_qr("HELLO WORLD", CorrectionLevel::L).unwrap();
/// assert_eq!(tree.attr("width"), Some("29mm"));
/// ```
pub fn encode_qr(payload: &str, level: CorrectionLevel) -> Result<Element> {
    QrEncoder::default().encode(payload, level)
}
