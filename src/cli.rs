//! CLI - Command Line Interface for ktuvit-subs
//!
//! Every engine operation is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Movie subtitles (needs an account)
//! ktuvit-subs search "The Matrix" --imdb tt0133093
//!
//! # Episode subtitles
//! ktuvit-subs search "Breaking Bad" --imdb tt0903747 --series -s 1 -e 5
//!
//! # Download by the id printed by search
//! ktuvit-subs download AABBCCDDEEFF00112233445566778899:1234 -o episode.he.srt
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{MediaKind, SearchQuery};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments or configuration
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Nothing matched
    NotFound = 4,
    /// Login rejected
    AuthFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// ktuvit-subs - Hebrew subtitles from Ktuvit.me
#[derive(Parser, Debug)]
#[command(
    name = "ktuvit-subs",
    version,
    about = "Search and download Hebrew subtitles from Ktuvit.me",
    long_about = "Search and download Hebrew subtitles from Ktuvit.me.\n\n\
                  Movie subtitles require a Ktuvit.me account (set username and \
                  password in the config file or KTUVIT_USERNAME / KTUVIT_PASSWORD).\n\
                  Series subtitles work without an account.",
    after_help = "EXAMPLES:\n\
                  ktuvit-subs search \"The Matrix\" --imdb tt0133093\n\
                  ktuvit-subs search \"Breaking Bad\" --imdb tt0903747 --series -s 1 -e 5\n\
                  ktuvit-subs download <id> -o movie.he.srt\n\
                  ktuvit-subs validate"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Default tracing filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "ktuvit_subs=debug"
        } else if self.quiet {
            "ktuvit_subs=warn"
        } else {
            "ktuvit_subs=info"
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search subtitles for a movie or an episode
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Resolve a title to its Ktuvit catalog id
    #[command(visible_alias = "id")]
    Resolve(ResolveCmd),

    /// Download a subtitle by id
    #[command(visible_alias = "dl")]
    Download(DownloadCmd),

    /// Check the configuration against Ktuvit.me
    Validate(ValidateCmd),

    /// Show the effective configuration
    Config(ConfigCmd),
}

// =============================================================================
// Search Command
// =============================================================================

/// Search subtitles by title and IMDb id
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Title as listed on Ktuvit.me
    #[arg(required = true)]
    pub title: String,

    /// IMDB ID (e.g., tt0903747)
    #[arg(long, short = 'i')]
    pub imdb: String,

    /// Search series instead of movies
    #[arg(long)]
    pub series: bool,

    /// Season number (series only)
    #[arg(long, short = 's', requires = "series")]
    pub season: Option<u32>,

    /// Episode number (series only)
    #[arg(long, short = 'e', requires = "series")]
    pub episode: Option<u32>,

    /// Maximum number of results
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,
}

impl SearchCmd {
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            title: self.title.clone(),
            kind: if self.series {
                MediaKind::Series
            } else {
                MediaKind::Movie
            },
            external_id: Some(self.imdb.clone()),
            season: self.season,
            episode: self.episode,
        }
    }

    /// Series searches need both season and episode
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.series && (self.season.is_none() || self.episode.is_none()) {
            return Err("Series search needs --season and --episode");
        }
        Ok(())
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

/// Resolve a title to its catalog id
#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// Title as listed on Ktuvit.me
    #[arg(required = true)]
    pub title: String,

    /// IMDB ID (e.g., tt0903747)
    #[arg(long, short = 'i')]
    pub imdb: String,

    /// Resolve a series instead of a movie
    #[arg(long)]
    pub series: bool,
}

impl ResolveCmd {
    pub fn kind(&self) -> MediaKind {
        if self.series {
            MediaKind::Series
        } else {
            MediaKind::Movie
        }
    }
}

// =============================================================================
// Download Command
// =============================================================================

/// Download a subtitle file
#[derive(Args, Debug)]
pub struct DownloadCmd {
    /// Subtitle id from search results (<subtitle-id>:<film-id>)
    #[arg(required = true)]
    pub id: String,

    /// Output file (default: <subtitle-id>.he.srt)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

// =============================================================================
// Validate / Config Commands
// =============================================================================

/// Validate timeout, reachability and credentials
#[derive(Args, Debug)]
pub struct ValidateCmd {
    /// Only run local checks
    #[arg(long)]
    pub offline: bool,
}

/// Show the effective configuration
#[derive(Args, Debug)]
pub struct ConfigCmd {
    /// Write a config file template first (fails if the file exists)
    #[arg(long)]
    pub init: bool,
}

// =============================================================================
// Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Status OK response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

/// Result of `resolve`
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolvedId {
    pub title: String,
    pub imdb_id: String,
    pub catalog_id: String,
}

/// Result of `download`
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedSubtitle {
    pub path: PathBuf,
    pub bytes: usize,
    pub language: String,
    pub format: String,
}

/// Configuration as printed by `config`
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigView {
    pub title: String,
    pub description: String,
    pub path: Option<PathBuf>,
    pub username: Option<String>,
    pub password_set: bool,
    pub request_timeout: Option<i64>,
}

// =============================================================================
// Output Helpers
// =============================================================================

pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            // For non-JSON, caller should handle formatting
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// IMDB ID Validation
// =============================================================================

/// Validate IMDB ID format (tt followed by digits)
pub fn validate_imdb_id(id: &str) -> Result<&str, &'static str> {
    if id.starts_with("tt") && id.len() >= 9 && id[2..].chars().all(|c| c.is_ascii_digit()) {
        Ok(id)
    } else {
        Err("Invalid IMDB ID format (expected tt followed by 7+ digits)")
    }
}

// =============================================================================
// Tests
// =============================================================================
