//! reserve-live - live-update client for the reserve dev server.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use reserve_live::ClientConfig;
use reserve_live::cli::{Cli, watch};
use reserve_live::logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = ClientConfig::load(&cli)?;
    watch(&cli, config)
}
