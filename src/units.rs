//! SVG lengths and the small geometry types built on them.
//!
//! Every length is normalised to pixels at 90 dpi before any arithmetic, which
//! is the resolution older Inkscape files assume. The percent unit is kept as a
//! plain scale factor of `-100`; it is not a relative length.
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Units accepted in an SVG length.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Unit {
    #[default]
    Px,
    Pt,
    Pc,
    In,
    Mm,
    Cm,
    /// Converted as `value / -100` pixels, the convention of the 90 dpi table.
    Percent,
}

impl Unit {
    /// Every supported unit.
    pub const ALL: [Unit; 7] = [
        Unit::Px,
        Unit::Pt,
        Unit::Pc,
        Unit::In,
        Unit::Mm,
        Unit::Cm,
        Unit::Percent,
    ];

    /// The suffix used in SVG attribute values.
    pub fn suffix(self) -> &'static str {
        use Unit::*;
        match self {
            Px => "px",
            Pt => "pt",
            Pc => "pc",
            In => "in",
            Mm => "mm",
            Cm => "cm",
            Percent => "%",
        }
    }

    /// Converts `value` expressed in this unit to pixels.
    pub fn to_pixels(self, value: f64) -> f64 {
        use Unit::*;
        match self {
            Px => value,
            Pt => value * 1.25,
            Pc => value * 15.0,
            In => value * 90.0,
            Mm => value * 3.543307,
            Cm => value * 35.43307,
            Percent => value / -100.0,
        }
    }

    /// Converts a pixel value into this unit.
    pub fn from_pixels(self, value: f64) -> f64 {
        use Unit::*;
        match self {
            Px => value,
            Pt => value / 1.25,
            Pc => value / 15.0,
            In => value / 90.0,
            Mm => value / 3.543307,
            Cm => value / 35.43307,
            Percent => value * -100.0,
        }
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Unit::ALL
            .into_iter()
            .find(|unit| unit.suffix() == s)
            .ok_or_else(|| Error::Format(format!("Unknown length units: {}", s)))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Parses `value` as an SVG length and returns it in pixels.
///
/// A bare number is read in `default_unit`. Empty input is `0.0`.
///
/// # Errors
///
/// Returns [`Error::Format`] when the number is malformed or the unit suffix is
/// not one of `px`, `pt`, `pc`, `in`, `mm`, `cm` or `%`.
///
/// # Example
///
/// ```rust
/// use qrsvg::units::{length_to_pixels, Unit};
///
/// assert_eq!(length_to_pixels("10", Unit::Px).unwrap(), 10.0);
/// assert_eq!(length_to_pixels("2in", Unit::Px).unwrap(), 180.0);
/// ```
pub fn length_to_pixels(value: &str, default_unit: Unit) -> Result<f64> {
    Ok(match parse_length(value)? {
        Some((number, unit)) => unit.unwrap_or(default_unit).to_pixels(number),
        None => 0.0,
    })
}

/// Parses `value` as an SVG length and expresses it in `unit`.
///
/// Bare numbers are pixels. A length already written in `unit` is returned
/// as is, without a round trip through pixels.
pub fn length_in(value: &str, unit: Unit) -> Result<f64> {
    Ok(match parse_length(value)? {
        Some((number, Some(own))) if own == unit => number,
        Some((number, own)) => unit.from_pixels(own.unwrap_or(Unit::Px).to_pixels(number)),
        None => 0.0,
    })
}

/// Number and optional unit of an SVG length, `None` for empty input.
fn parse_length(value: &str) -> Result<Option<(f64, Option<Unit>)>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (number, rest) = split_number(trimmed)
        .ok_or_else(|| Error::Format(format!("Unknown length format: \"{}\"", value)))?;
    let number: f64 = number
        .parse()
        .map_err(|_| Error::Format(format!("Unknown length format: \"{}\"", value)))?;

    let rest = rest.trim();
    let unit = if rest.is_empty() { None } else { Some(rest.parse()?) };
    Ok(Some((number, unit)))
}

/// Splits `-?\d+(\.\d+)?` off the front of `s`.
fn split_number(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == int_start {
        return None;
    }

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            end = frac_end;
        }
    }

    Some(s.split_at(end))
}

/// An SVG `viewBox` rectangle.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parses a `viewBox` attribute.
    ///
    /// Tokens are separated by any run of spaces, commas or tabs. Returns `None`
    /// unless there are exactly four valid lengths spanning a positive area.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrsvg::units::ViewBox;
    ///
    /// let vb = ViewBox::parse("0 0 100 100").unwrap();
    /// assert_eq!((vb.width, vb.height), (100.0, 100.0));
    /// assert!(ViewBox::parse("0 0 0 100").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<ViewBox> {
        let values = text
            .trim()
            .split(|c| c == ' ' || c == ',' || c == '\t')
            .filter(|token| !token.is_empty())
            .map(|token| length_to_pixels(token, Unit::Px).ok())
            .collect::<Option<Vec<f64>>>()?;

        let [x, y, width, height] = values[..] else {
            return None;
        };

        if width * height <= 0.0 {
            return None;
        }

        Some(ViewBox { x, y, width, height })
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} {:.6} {:.6} {:.6}", self.x, self.y, self.width, self.height)
    }
}

/// A width and height expressed in a single unit.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Size {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl Size {
    pub fn new(width: f64, height: f64, unit: Unit) -> Self {
        Self { width, height, unit }
    }

    /// Parses two SVG lengths and expresses both in `unit`.
    ///
    /// Bare numbers are read as pixels.
    pub fn from_strings(width: &str, height: &str, unit: Unit) -> Result<Self> {
        Ok(Self {
            width: length_in(width, unit)?,
            height: length_in(height, unit)?,
            unit,
        })
    }

    /// The larger of the two dimensions.
    pub fn max_side(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// A displacement in the drawing unit.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
