//! ami-helper - Find ATLAS datasets by AMI hashtag
//!
//! Searches the AMI metadata service for PMG central-page hashtags and the
//! datasets carrying them.
//!
//! # Examples
//!
//! ```bash
//! ami-helper hashtags find mc23_13p6TeV ttbar
//! ami-helper datasets with-hashtags mc23_13p6TeV Top ttbar Dilepton Nominal
//! ```

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v / -vv pick the level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose > 0)
        .with_file(source_locations(cli.verbose))
        .with_line_number(source_locations(cli.verbose))
        .init();

    cli::run(cli)
}

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// `-vv` also prints the file and line of each event
fn source_locations(verbose: u8) -> bool {
    verbose > 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(5), "debug");
    }

    #[test]
    fn test_source_locations_only_at_debug() {
        assert!(!source_locations(0));
        assert!(!source_locations(1));
        assert!(source_locations(2));
    }
}
