//! CLI module for the content gateway
//!
//! - `serve`: run the HTTP server
//! - `migrate`: apply storage migrations and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Content Gateway - paywalled content and moderated comments
#[derive(Parser)]
#[command(name = "content-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Apply Postgres storage migrations and exit
    Migrate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["content-gateway", "migrate"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Migrate)));

        let cli = Cli::try_parse_from(["content-gateway"]).unwrap();
        assert!(cli.command.is_none());

        assert!(Cli::try_parse_from(["content-gateway", "ui"]).is_err());
    }
}
