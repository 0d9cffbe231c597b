//! evdump - dump events from input devices to stdout

use anyhow::{Context, Result};
use clap::Parser;
use evtools::filter::parse_number;
use evtools::{EventFilter, Monitor, Settings, SymbolResolver, device, logging};
use std::io;
use std::path::PathBuf;
use tracing::info;

const AFTER_HELP: &str = "\
Device names can be given as a full path such as '/dev/input/event3', as
'event3', or just as '3'.

Devices whose path contains 'mouse' or 'mice' are read as generic three-octet
mice and turned into the event stream a real event device would report.";

#[derive(Parser, Debug)]
#[command(version, about = "Dump events from input devices to stdout", after_help = AFTER_HELP)]
struct Args {
    /// Only output events of this type
    #[arg(short = 't', value_name = "TYPE", value_parser = parse_number::<u16>)]
    only_type: Option<u16>,

    /// Only output events with this code
    #[arg(short = 'c', value_name = "CODE", value_parser = parse_number::<u16>)]
    only_code: Option<u16>,

    /// Only output events with this value
    #[arg(
        short = 'v',
        value_name = "VALUE",
        value_parser = parse_number::<i32>,
        allow_hyphen_values = true
    )]
    only_value: Option<i32>,

    /// Settings file (default: ~/.config/evtools/settings.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long)]
    verbose: bool,

    /// Event devices to monitor
    #[arg(required = true, value_name = "DEVICE")]
    devices: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let symbols = SymbolResolver::linux();
    let devices = device::acquire_all(&args.devices, &settings, &symbols)?;

    let filter = EventFilter {
        class: args.only_type,
        code: args.only_code,
        value: args.only_value,
    };
    let mut monitor = Monitor::new(devices, filter, symbols, io::stdout().lock());
    info!("Monitoring {} device(s)", monitor.devices().len());

    let never = monitor.run().context("Monitoring stopped")?;
    match never {}
}
