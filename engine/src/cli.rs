//! CLI interface for Shield
//!
//! This module provides the command-line interface using clap's derive API.
//! The binary is the demo intake layer over the dispute-call engine: run one
//! call end to end, or inspect the transcript archive.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shield Dispute-Call Engine
///
/// Places outbound voice-agent calls to customers with open charge disputes,
/// then evaluates the call and files evidence with the billing platform.
#[derive(Parser, Debug)]
#[command(name = "shield")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one dispute-resolution call end to end
    Call {
        /// Billing charge id with an open dispute (e.g. ch_...)
        charge_id: String,

        /// Dial this number instead of the one on the billing record
        #[arg(long, value_name = "NUMBER")]
        phone: Option<String>,

        /// Run the deterministic scripted call instead of dialing out
        #[arg(long)]
        simulate: bool,

        /// Push evidence to the bank immediately instead of staging it
        #[arg(long)]
        submit: bool,
    },

    /// List archived call transcripts
    Transcripts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_command() {
        let cli = Cli::parse_from(["shield", "call", "ch_123"]);
        if let Command::Call {
            charge_id,
            phone,
            simulate,
            submit,
        } = cli.command
        {
            assert_eq!(charge_id, "ch_123");
            assert!(phone.is_none());
            assert!(!simulate);
            assert!(!submit);
        } else {
            panic!("Expected Call command");
        }
    }

    #[test]
    fn test_call_flags() {
        let cli = Cli::parse_from([
            "shield",
            "call",
            "ch_123",
            "--phone",
            "+15550001111",
            "--simulate",
            "--submit",
        ]);
        if let Command::Call {
            phone,
            simulate,
            submit,
            ..
        } = cli.command
        {
            assert_eq!(phone.as_deref(), Some("+15550001111"));
            assert!(simulate);
            assert!(submit);
        } else {
            panic!("Expected Call command");
        }
    }

    #[test]
    fn test_transcripts_command() {
        let cli = Cli::parse_from(["shield", "transcripts"]);
        assert!(matches!(cli.command, Command::Transcripts));
        assert!(!cli.json);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["shield", "--json", "--log", "debug", "transcripts"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
    }
}
