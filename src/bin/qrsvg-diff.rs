//! Get QR code content and SVG logo part, if any.
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use qrsvg::cli::{init_logging, DiffArgs, Failure};
use qrsvg::diff::{decode_content, extract_logo};

fn main() -> ExitCode {
    let args = DiffArgs::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => Failure::from_error(&err).report(),
    }
}

fn run(args: &DiffArgs) -> Result<()> {
    let (content, logo) = args.selection();

    if logo {
        let text = std::fs::read_to_string(&args.file)
            .with_context(|| format!("Cannot read {}", args.file.display()))?;
        if let Some(svg) = extract_logo(&text)? {
            println!("{}", svg);
        }
    }

    if content {
        let data = decode_content(&args.file)
            .with_context(|| format!("Cannot decode {}", args.file.display()))?;
        println!("{}", data);
    }

    Ok(())
}
