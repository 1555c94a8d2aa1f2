//! ktuvit-subs - Hebrew subtitles from Ktuvit.me
//!
//! Finds and downloads Hebrew subtitles for movies and TV episodes from a
//! catalog site with no public API: titles are matched by IMDb id through the
//! site's JSON services, subtitle tables are scraped from its pages, and files
//! are fetched through a two-step token exchange.
//!
//! # Modules
//!
//! - `models` - Queries, listings, results and downloaded artifacts
//! - `api` - Catalog client, transport, scraping and login encryption
//! - `engine` - Process-wide client and the blocking bridge
//! - `config` - Settings file and validation
//! - `cli` / `commands` - Command line surface

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod models;

// Re-export commonly used types
pub use models::{
    AccessOutcome, AuthOutcome, CompositeId, Credentials, FilmMatch, MediaKind,
    RemoteSubtitleResult, SearchQuery, SubFormat, SubtitleArtifact, SubtitleListing,
};

pub use api::{KtuvitClient, KtuvitError, PasswordCipher, SaltedAesCipher};
pub use config::{Config, ConfigError};
pub use engine::{run_blocking, EngineCell};
