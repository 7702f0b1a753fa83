//! Command-line arguments and logging setup for the `qrsvg` binaries.
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{ArgAction, Parser};
use log::error;

use crate::encoder::CorrectionLevel;
use crate::error::Error;
use crate::mask::Threshold;
use crate::qr::LogoOptions;
use crate::units::Offset;

/// Generate an SVG QR code with a logo in the middle.
#[derive(Parser, Debug, Clone)]
#[command(name = "qrsvg", version)]
pub struct Args {
    /// SVG logo placed at the centre of the code
    pub logo: PathBuf,

    /// Text to encode; prompts for a URL or contact card when omitted
    pub data: Option<String>,

    /// Where to write the SVG
    #[arg(short, long, default_value = "output.svg")]
    pub output: PathBuf,

    /// Logo size relative to the code, in (0, 1]
    #[arg(short, long, default_value_t = 0.3, value_parser = parse_scale)]
    pub scale: f64,

    /// Blur radius used when deciding which dots the logo hides
    #[arg(short, long, default_value_t = 1.0, value_parser = parse_blur)]
    pub blur: f32,

    /// Extra space cleared around the logo
    #[arg(short, long, default_value_t = 0)]
    pub margin: u32,

    /// Shift the logo by X Y millimetres without moving the cleared area
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["X", "Y"],
        allow_negative_numbers = true
    )]
    pub correct: Option<Vec<f64>>,

    /// Error correction level
    #[arg(short, long, default_value = "H", value_parser = parse_level)]
    pub error_correction: CorrectionLevel,

    /// Dot removal threshold: `footprint` (logo mean) or `mask` (whole-code mean)
    #[arg(short, long, default_value = "footprint", value_parser = parse_threshold)]
    pub threshold: Threshold,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn logo_options(&self) -> LogoOptions {
        let offset = match self.correct.as_deref() {
            Some([x, y]) => Offset::new(*x, *y),
            _ => Offset::default(),
        };
        LogoOptions {
            scale: self.scale,
            blur: self.blur,
            margin: self.margin,
            offset,
            threshold: self.threshold,
        }
    }
}

/// Print the content and/or embedded logo of a generated QR SVG.
#[derive(Parser, Debug, Clone)]
#[command(name = "qrsvg-diff", version)]
pub struct DiffArgs {
    /// Generated QR SVG
    pub file: PathBuf,

    /// Print the data content of the QR code
    #[arg(short, long)]
    pub content: bool,

    /// Print the SVG logo
    #[arg(short, long)]
    pub logo: bool,

    /// More log output
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl DiffArgs {
    /// `(content, logo)`; selecting neither means both.
    pub fn selection(&self) -> (bool, bool) {
        if self.content || self.logo {
            (self.content, self.logo)
        } else {
            (true, true)
        }
    }
}

fn parse_scale(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("scale must be in (0, 1], got {}", value))
    }
}

fn parse_blur(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("blur must be a non-negative number, got {}", value))
    }
}

fn parse_level(s: &str) -> Result<CorrectionLevel, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_threshold(s: &str) -> Result<Threshold, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

/// Why a binary run failed.
#[derive(Debug, PartialEq, Eq)]
pub enum Failure {
    /// The user cancelled an interactive prompt.
    Aborted,
    /// Anything else, with its full context chain.
    Error(String),
}

impl Failure {
    pub fn from_error(err: &anyhow::Error) -> Self {
        if matches!(err.downcast_ref::<Error>(), Some(Error::InputAborted)) {
            Failure::Aborted
        } else {
            Failure::Error(format!("{:#}", err))
        }
    }

    /// Reports the failure once on stderr and returns the exit status.
    pub fn report(&self) -> ExitCode {
        match self {
            Failure::Aborted => eprintln!("Aborted."),
            Failure::Error(message) => error!("{}", message),
        }
        ExitCode::from(1)
    }
}

/// Sets up `env_logger` with timestamped lines on stderr.
///
/// `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_default_env();
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] [{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        )
    });
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level);
    }
    builder.try_init().ok();
}
