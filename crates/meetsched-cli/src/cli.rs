//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use meetsched_providers::ConsentMode;

/// meetsched - Google Calendar meetings with Meet links, over HTTP
#[derive(Debug, Parser)]
#[command(name = "meetsched")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MEETSCHED_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub google: GoogleArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Google OAuth client settings; each overrides the config file.
#[derive(Debug, Default, Clone, Args)]
pub struct GoogleArgs {
    /// OAuth client ID (from Google Cloud Console)
    #[arg(long, env = "GOOGLE_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// OAuth client secret (from Google Cloud Console)
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// Redirect URI registered for the client
    #[arg(long, env = "GOOGLE_REDIRECT_URI", global = true)]
    pub redirect_uri: Option<String>,

    /// Path to Google Cloud Console credentials JSON file
    ///
    /// Used when client ID and secret are not given otherwise.
    #[arg(long, env = "GOOGLE_CREDENTIALS_FILE", global = true)]
    pub credentials_file: Option<PathBuf>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server in the foreground
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// How to deliver the consent URL (browser, console, caller)
        #[arg(long)]
        consent: Option<ConsentMode>,

        /// Emit JSON log lines
        #[arg(long)]
        json_logs: bool,
    },

    /// Print the Google consent URL
    ConsentUrl,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
