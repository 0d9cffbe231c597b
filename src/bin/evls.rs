//! evls - list input device capabilities

use anyhow::{Context, Result};
use clap::Parser;
use evtools::{EventDevice, Settings, SymbolResolver, caps, device, logging};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "List capabilities and state of input devices")]
struct Args {
    /// Settings file (default: ~/.config/evtools/settings.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Devices to list (default: every event device)
    #[arg(value_name = "DEVICE")]
    devices: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let symbols = SymbolResolver::linux();

    let paths: Vec<PathBuf> = if args.devices.is_empty() {
        caps::event_nodes(&settings.input_dir)
            .with_context(|| format!("Cannot list {}", settings.input_dir.display()))?
    } else {
        args.devices
            .iter()
            .map(|arg| {
                let candidates = device::candidate_paths(arg, &settings.input_dir);
                match candidates.iter().find(|p| p.exists()) {
                    Some(path) => path.clone(),
                    None => {
                        warn!("Can't find event device '{arg}'");
                        PathBuf::from(arg)
                    }
                }
            })
            .collect()
    };

    let results = caps::scan(paths, |path: &Path| EventDevice::open(path), &symbols);
    let mut out = io::stdout().lock();
    let mut listed = 0;
    for report in results.iter().flatten() {
        write!(out, "{report}")?;
        listed += 1;
    }
    out.flush()?;

    if listed == 0 {
        info!("No input devices listed");
    }
    Ok(())
}
