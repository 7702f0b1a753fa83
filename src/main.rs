use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use qrsvg::cli::{init_logging, Args, Failure};
use qrsvg::prompt::prompt_payload;
use qrsvg::Qr;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => Failure::from_error(&err).report(),
    }
}

fn run(args: &Args) -> Result<()> {
    let data = match &args.data {
        Some(data) => data.clone(),
        None => prompt_payload()?.into_data(),
    };
    debug!("Payload:\n{}", data);

    let mut qr = Qr::new(data, args.error_correction)
        .with_context(|| format!("Failed to encode payload at level {}", args.error_correction))?;
    let before = qr.dot_count();

    qr.add_logo(&args.logo, &args.logo_options())
        .with_context(|| format!("Failed to add logo {}", args.logo.display()))?;
    info!("Logo removed {} of {} dots", before - qr.dot_count(), before);

    qr.save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("{}", args.output.display());
    Ok(())
}
