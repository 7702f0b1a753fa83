//! # qrsvg
//!
//! A Rust library for generating SVG QR codes with a logo in the middle.
//!
//! `qrsvg` encodes text into a QR symbol, draws every dark module as a circle in an SVG
//! document measured in millimetres, and can place an SVG logo at the centre. Dots hidden by
//! the logo are removed: the logo is rasterized, blurred, and compared against the mean
//! intensity of the whole code, so only the dots under the painted parts of the logo go away.
//! A high error correction level keeps the result scannable.
//!
//! ## Features
//!
//! - Circle-dot SVG output with a 4-module quiet zone.
//! - Four error correction levels: L, M, Q, H.
//! - Logo placement with scale, blur, margin and manual offset correction.
//! - vCard 3.0 payloads for contact cards.
//! - Optional read-back of generated codes (`validate` feature, on by default).
//! - The `qrsvg` and `qrsvg-diff` binaries (`cli` feature, on by default). Library users
//!   can drop their dependencies with `default-features = false`.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrsvg = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Generate a QR code for a contact card with a logo:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use qrsvg::{vcard::VCard, CorrectionLevel, LogoOptions, Qr};
//!
//! fn main() -> qrsvg::Result<()> {
//!     let mut card = VCard::new("Forest", "Gump");
//!     card.add_organization("Bubba Gump Shrimp Co.")
//!         .add_email("forest.gump@bubbagump.com");
//!
//!     let mut qr = Qr::new(card.to_string(), CorrectionLevel::H)?;
//!     qr.add_logo(Path::new("logo.svg"), &LogoOptions { margin: 2, ..LogoOptions::default() })?;
//!     qr.save(Path::new("vcard.svg"))
//! }
//! ```
//!
//! ## Modules
//!
//! - [`units`]: SVG lengths, sizes and viewBoxes.
//! - [`encoder`]: QR encoding into a circle-dot SVG tree.
//! - [`raster`]: SVG rasterization and blur.
//! - [`mask`]: the logo mask that decides which dots are removed.
//! - [`qr`]: the [`Qr`] composer.
//! - [`vcard`]: vCard 3.0 builder.
//! - [`svg`]: owned SVG element tree and writer.
//! - [`diff`]: inspection of generated codes.
//! - `cli` and `prompt`: argument parsing and interactive input for the binaries.

#[cfg(feature = "cli")]
pub mod cli;
pub mod diff;
pub mod encoder;
pub mod error;
pub mod mask;
#[cfg(feature = "cli")]
pub mod prompt;
pub mod qr;
pub mod raster;
pub mod svg;
pub mod units;
#[cfg(feature = "validate")]
pub mod validate;
pub mod vcard;

pub use encoder::CorrectionLevel;
pub use error::{Error, Result};
pub use mask::Threshold;
pub use qr::{LogoOptions, Qr};
