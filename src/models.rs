//! Data structures shared across the engine
//!
//! Organized by domain:
//! - **Search**: queries and catalog film candidates
//! - **Auth**: credentials and handshake outcomes
//! - **Subtitles**: extracted listings, remote results and downloaded artifacts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Author reported on every remote result
pub const AUTHOR: &str = "Ktuvit.me";

/// Provider name reported on every remote result
pub const PROVIDER_NAME: &str = "Ktuvit";

/// The catalog only serves Hebrew subtitles
pub const LANGUAGE: &str = "he";

// =============================================================================
// Search Models
// =============================================================================

/// Kind of title being searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Value of the `SearchType` field in catalog search requests
    pub fn search_type(&self) -> u8 {
        match self {
            MediaKind::Movie => 0,
            MediaKind::Series => 1,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "Movie"),
            MediaKind::Series => write!(f, "Series"),
        }
    }
}

/// A subtitle lookup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub kind: MediaKind,
    /// IMDb id (e.g. tt0903747) used to pick the right catalog entry
    pub external_id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl SearchQuery {
    pub fn movie(title: impl Into<String>, imdb_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: MediaKind::Movie,
            external_id: Some(imdb_id.into()),
            season: None,
            episode: None,
        }
    }

    pub fn episode(
        title: impl Into<String>,
        imdb_id: impl Into<String>,
        season: u32,
        episode: u32,
    ) -> Self {
        Self {
            title: title.into(),
            kind: MediaKind::Series,
            external_id: Some(imdb_id.into()),
            season: Some(season),
            episode: Some(episode),
        }
    }
}

/// One candidate returned by the catalog search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmMatch {
    #[serde(rename = "ID")]
    pub catalog_id: String,
    #[serde(rename = "ImdbID", default)]
    pub external_id: Option<String>,
    #[serde(rename = "IMDB_Link", default)]
    pub external_link: Option<String>,
}

impl FilmMatch {
    /// IMDb id embedded in the external link: the second-to-last `/` segment,
    /// so `https://www.imdb.com/title/tt0903747/` yields `tt0903747`.
    pub fn linked_external_id(&self) -> Option<&str> {
        let link = self.external_link.as_deref()?;
        let segments: Vec<&str> = link.split('/').collect();
        if segments.len() < 2 {
            return None;
        }
        Some(segments[segments.len() - 2])
    }

    /// Exact, case-sensitive comparison against either id source
    pub fn matches(&self, external_id: &str) -> bool {
        self.external_id.as_deref() == Some(external_id)
            || self.linked_external_id() == Some(external_id)
    }
}

// =============================================================================
// Auth Models
// =============================================================================

/// Catalog account. Empty username and password means series-only mode.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields are empty (series-only mode)
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }

    /// Both fields are present, so movie lookups can authenticate
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of the login handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Failed(String),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated)
    }

    /// Human-readable failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            AuthOutcome::Authenticated => None,
            AuthOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Result of probing the catalog root page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Reachable,
    Unreachable(String),
}

impl AccessOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, AccessOutcome::Reachable)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AccessOutcome::Reachable => None,
            AccessOutcome::Unreachable(reason) => Some(reason),
        }
    }
}

// =============================================================================
// Subtitle Models
// =============================================================================

/// Subtitle file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubFormat {
    Srt,
}

impl SubFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SubFormat::Srt => "srt",
        }
    }
}

/// A row pulled out of a catalog subtitle table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleListing {
    pub title: String,
    /// 32 hex characters
    pub opaque_id: String,
}

/// Subtitle search result handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubtitleResult {
    pub author: String,
    pub title: String,
    pub provider_name: String,
    /// `{opaque_id}:{catalog_id}`, see [`CompositeId`]
    pub id: String,
    pub language: String,
    pub is_forced: bool,
    pub format: SubFormat,
}

impl RemoteSubtitleResult {
    pub fn from_listing(listing: SubtitleListing, catalog_id: &str) -> Self {
        let id = CompositeId::new(listing.opaque_id, catalog_id).to_string();
        Self {
            author: AUTHOR.to_string(),
            title: listing.title,
            provider_name: PROVIDER_NAME.to_string(),
            id,
            language: LANGUAGE.to_string(),
            is_forced: false,
            format: SubFormat::Srt,
        }
    }
}

/// Subtitle id as exposed to callers: `{subtitle_id}:{film_id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId {
    pub subtitle_id: String,
    pub film_id: String,
}

impl CompositeId {
    pub fn new(subtitle_id: impl Into<String>, film_id: impl Into<String>) -> Self {
        Self {
            subtitle_id: subtitle_id.into(),
            film_id: film_id.into(),
        }
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subtitle_id, self.film_id)
    }
}

impl FromStr for CompositeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((subtitle_id, film_id)) if !subtitle_id.is_empty() && !film_id.is_empty() => {
                Ok(Self::new(subtitle_id, film_id))
            }
            _ => Err(format!(
                "Invalid subtitle id '{}' (expected <subtitle-id>:<film-id>)",
                s
            )),
        }
    }
}

/// Downloaded subtitle. The stream is positioned at offset 0.
#[derive(Debug)]
pub struct SubtitleArtifact {
    pub stream: Cursor<Vec<u8>>,
    pub format: SubFormat,
    pub language: String,
}

impl SubtitleArtifact {
    pub fn srt(data: Vec<u8>) -> Self {
        Self {
            stream: Cursor::new(data),
            format: SubFormat::Srt,
            language: LANGUAGE.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.stream.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.stream.into_inner()
    }
}

// =============================================================================
// Tests
// =============================================================================
