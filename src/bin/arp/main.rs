//! arp - terminal arpeggiator
//!
//! Run with: cargo run --bin arp -- [--bpm 120] [--meter 7/8] [--then 4/4] [-v]

mod app;
mod monitor;
mod ui;

use std::fs::File;

use clap::{crate_version, Parser};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use saavy_arp::sequencing::TimeSignature;

use app::Arp;

const LOG_FILE: &str = "arp.log";

#[derive(Parser, Debug)]
#[clap(version = crate_version!(), about = "Barlow-accented MIDI arpeggiator.")]
struct Args {
    /// Tempo in quarter notes per minute.
    #[clap(long, default_value_t = 120.0)]
    bpm: f64,
    /// Time signature, e.g. 7/8.
    #[clap(long = "meter", value_parser = parse_meter, default_value = "4/4")]
    time_signature: TimeSignature,
    /// Second time signature, alternating every four bars.
    #[clap(long = "then", value_parser = parse_meter)]
    alternate: Option<TimeSignature>,
    /// Log at debug level.
    #[clap(short, long)]
    verbose: bool,
}

fn parse_meter(value: &str) -> EyreResult<TimeSignature> {
    let (numerator, denominator) = value
        .split_once('/')
        .ok_or_else(|| eyre!("meter must look like 7/8, got {value:?}"))?;
    let numerator: u8 = numerator
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid meter numerator in {value:?}"))?;
    let denominator: u8 = denominator
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid meter denominator in {value:?}"))?;

    if numerator == 0 || !denominator.is_power_of_two() || denominator > 32 {
        return Err(eyre!("unsupported meter {value:?}"));
    }
    Ok(TimeSignature::new(numerator, denominator))
}

fn init_logging(verbose: bool) -> EyreResult<()> {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let log_file = File::create(LOG_FILE).wrap_err_with(|| format!("cannot create {LOG_FILE}"))?;
    WriteLogger::init(log_level, Config::default(), log_file).wrap_err("failed to initialize logger")?;

    log::info!("arp starting (log level: {:?})", log_level);
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();
    if !(args.bpm.is_finite() && args.bpm > 0.0) {
        return Err(eyre!("bpm must be positive, got {}", args.bpm));
    }
    init_logging(args.verbose)?;

    let mut arp = Arp::new().bpm(args.bpm).meter(args.time_signature);
    if let Some(alternate) = args.alternate {
        arp = arp.alternate_with(alternate);
    }
    arp.run()
}
