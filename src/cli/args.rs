//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Live-reload client for a reserve dev server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Page to attach to (overrides `[page] url`)
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: reserve.toml, optional)
    #[arg(short = 'C', long, default_value = "reserve.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Delay before reconnecting after the channel closed, in milliseconds
    #[arg(long, value_name = "MS")]
    pub reconnect_delay: Option<u64>,

    /// Hard reload the page when the channel comes back after a disconnect
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub reload_on_reconnect: Option<bool>,

    /// Forward lines read from stdin as broadcasts
    #[arg(short, long)]
    pub stdin_broadcast: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let err = Cli::try_parse_from(["reserve-live", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["reserve-live"]);
        assert!(cli.url.is_none());
        assert_eq!(cli.config, PathBuf::from("reserve.toml"));
        assert!(cli.reconnect_delay.is_none());
        assert!(cli.reload_on_reconnect.is_none());
        assert!(!cli.stdin_broadcast && !cli.verbose);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "reserve-live",
            "http://127.0.0.1:8080/",
            "-C",
            "dev.toml",
            "--reconnect-delay",
            "250",
            "--reload-on-reconnect",
            "-s",
            "-v",
            "--color",
            "never",
        ]);
        assert_eq!(cli.url.as_deref(), Some("http://127.0.0.1:8080/"));
        assert_eq!(cli.config, PathBuf::from("dev.toml"));
        assert_eq!(cli.reconnect_delay, Some(250));
        assert_eq!(cli.reload_on_reconnect, Some(true));
        assert!(cli.stdin_broadcast && cli.verbose);
        assert!(matches!(cli.color, ColorChoice::Never));
    }
}
