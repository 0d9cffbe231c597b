//! Log setup shared by the command-line tools

use tracing::Level;

/// Install a stderr fmt subscriber; stdout carries the tools' actual output.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}
