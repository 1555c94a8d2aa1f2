//! Ktuvit.me catalog client
//!
//! The site has no public API. Titles are resolved through the JSON search
//! service, subtitle tables are scraped from the movie page (login required)
//! or the series AJAX module, and downloads go through a token exchange.
//!
//! Every public operation absorbs its own failures: errors are logged and
//! surface as `None`, an empty list or a failed outcome.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::cipher::{PasswordCipher, SaltedAesCipher};
use super::envelope::{decode_envelope, RequestBody};
use super::error::{KtuvitError, Result};
use super::extract::extract_listings;
use super::transport::{HttpTransport, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::config::Config;
use crate::engine::run_blocking;
use crate::models::{
    AccessOutcome, AuthOutcome, CompositeId, Credentials, FilmMatch, MediaKind,
    RemoteSubtitleResult, SearchQuery, SubtitleArtifact, SubtitleListing,
};

const LOGIN_PATH: &str = "/Services/MembershipService.svc/Login";
const SEARCH_PATH: &str = "/Services/ContentProvider.svc/SearchPage_search";
const SERIES_PATH: &str = "/Services/GetModuleAjax.ashx?moduleName=SubtitlesList";
const REQUEST_DOWNLOAD_PATH: &str = "/Services/ContentProvider.svc/RequestSubtitleDownload";
const DOWNLOAD_PATH: &str = "/Services/DownloadFile.ashx";
const MOVIE_PATH: &str = "/MovieInfo.aspx";

/// Timeout for the reachability probe when none is configured
pub const DEFAULT_ACCESS_TIMEOUT: Duration = Duration::from_secs(5);

#[allow(clippy::expect_used)]
static ENCRYPTION_SALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var encryptionSalt = '([A-Z0-9].+)'").expect("salt regex is valid")
});

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SearchRequest<'a> {
    film_name: &'a str,
    actors: Vec<String>,
    studios: Option<Vec<String>>,
    directors: Vec<String>,
    genres: Vec<String>,
    countries: Vec<String>,
    languages: Vec<String>,
    year: &'a str,
    rating: Vec<String>,
    page: u32,
    search_type: u8,
    with_subs_only: bool,
}

impl<'a> SearchRequest<'a> {
    fn new(film_name: &'a str, kind: MediaKind) -> Self {
        Self {
            film_name,
            actors: Vec::new(),
            studios: None,
            directors: Vec::new(),
            genres: Vec::new(),
            countries: Vec::new(),
            languages: Vec::new(),
            year: "",
            rating: Vec::new(),
            page: 1,
            search_type: kind.search_type(),
            with_subs_only: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "Films", default)]
    films: Option<Vec<FilmMatch>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    #[serde(rename = "IsSuccess", default)]
    is_success: bool,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    #[serde(rename = "FilmID")]
    film_id: &'a str,
    #[serde(rename = "SubtitleID")]
    subtitle_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DownloadResult {
    #[serde(rename = "DownloadIdentifier", default)]
    download_identifier: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Ktuvit.me client
pub struct KtuvitClient {
    transport: HttpTransport,
    credentials: Credentials,
    cipher: Arc<dyn PasswordCipher>,
    access_timeout: Duration,
}

impl KtuvitClient {
    /// Create a client for the live site
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, credentials)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            transport: HttpTransport::new(base_url, DEFAULT_TIMEOUT),
            credentials,
            cipher: Arc::new(SaltedAesCipher),
            access_timeout: DEFAULT_ACCESS_TIMEOUT,
        }
    }

    /// Create a client from stored configuration
    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(config.credentials());
        match config.request_timeout() {
            Some(timeout) => client.with_timeout(timeout),
            None => client,
        }
    }

    /// Use `timeout` for every request, including the reachability probe
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = HttpTransport::new(self.transport.base_url().to_string(), timeout);
        self.access_timeout = timeout;
        self
    }

    /// Swap the password transform used by the login handshake
    pub fn with_cipher(mut self, cipher: impl PasswordCipher + 'static) -> Self {
        self.cipher = Arc::new(cipher);
        self
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // -------------------------------------------------------------------------
    // Identity resolution
    // -------------------------------------------------------------------------

    /// Find the catalog id of `title` whose IMDb id equals `external_id`.
    ///
    /// The first candidate in result order wins. No match, a bad status or an
    /// unreadable reply all give `None`.
    pub async fn resolve_identifier(
        &self,
        title: &str,
        kind: MediaKind,
        external_id: Option<&str>,
    ) -> Option<String> {
        let Some(external_id) = external_id.filter(|id| !id.is_empty()) else {
            info!(title, "No IMDb id to match catalog results against");
            return None;
        };

        info!(title, %kind, "Searching for Ktuvit ID");
        match self.search_films(title, kind).await {
            Ok(films) => {
                info!(title, count = films.len(), "Films found in search results");
                match first_match(&films, external_id) {
                    Some(catalog_id) => {
                        info!(title, catalog_id, "Match found");
                        Some(catalog_id.to_string())
                    }
                    None => {
                        info!(title, imdb_id = external_id, "No match found");
                        None
                    }
                }
            }
            Err(e) => {
                warn!(title, error = %e, "Ktuvit search failed");
                None
            }
        }
    }

    async fn search_films(&self, title: &str, kind: MediaKind) -> Result<Vec<FilmMatch>> {
        let body = RequestBody::new(SearchRequest::new(title, kind));
        let response = self
            .transport
            .post_json(SEARCH_PATH, &body)
            .await?
            .into_success_body()?;
        let result: SearchResult = decode_envelope(&response)?;
        Ok(result.films.unwrap_or_default())
    }

    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------

    /// Log in with `credentials` in a fresh session
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthOutcome {
        let session = self.transport.fresh_session();
        self.authenticate_in(&session, credentials).await
    }

    /// Blocking [`authenticate`](Self::authenticate) for synchronous callers
    pub fn authenticate_blocking(&self, credentials: &Credentials) -> AuthOutcome {
        run_blocking(self.authenticate(credentials))
            .unwrap_or_else(|e| AuthOutcome::Failed(e.reason()))
    }

    async fn authenticate_in(&self, session: &HttpTransport, credentials: &Credentials) -> AuthOutcome {
        match self.login(session, credentials).await {
            Ok(()) => {
                info!("Ktuvit authentication successful");
                AuthOutcome::Authenticated
            }
            Err(e) => {
                error!(error = %e, "Ktuvit authentication failed");
                let reason = match e {
                    KtuvitError::Auth(message) => message,
                    other => other.reason(),
                };
                AuthOutcome::Failed(reason)
            }
        }
    }

    async fn login(&self, session: &HttpTransport, credentials: &Credentials) -> Result<()> {
        let home = session.get_text("/", None).await?.into_success_body()?;
        let salt = extract_salt(&home).ok_or(KtuvitError::SaltNotFound)?;

        let encrypted = self
            .cipher
            .encrypt(&credentials.username, &credentials.password, salt)
            .filter(|e| !e.is_empty())
            .ok_or(KtuvitError::Encryption)?;

        let body = RequestBody::new(LoginRequest {
            email: &credentials.username,
            password: &encrypted,
        });
        let response = session
            .post_json(LOGIN_PATH, &body)
            .await?
            .into_success_body()?;
        let result: LoginResult = decode_envelope(&response)?;

        if result.is_success {
            Ok(())
        } else {
            Err(KtuvitError::Auth(
                result
                    .error_message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "login rejected".to_string()),
            ))
        }
    }

    /// Probe the home page. `timeout` defaults to the configured request
    /// timeout, or 5 seconds.
    pub async fn check_access(&self, timeout: Option<Duration>) -> AccessOutcome {
        let timeout = timeout.unwrap_or(self.access_timeout);
        let session = self.transport.fresh_session();
        match session.get_text("/", Some(timeout)).await {
            Ok(response) if response.is_success() => {
                info!("Ktuvit access validation successful");
                AccessOutcome::Reachable
            }
            Ok(response) => {
                error!(status = %response.status, "Ktuvit access validation failed");
                AccessOutcome::Unreachable(format!("Ktuvit.me returned HTTP {}", response.status))
            }
            Err(e) => {
                error!(error = %e, "Ktuvit access validation failed");
                AccessOutcome::Unreachable(e.reason())
            }
        }
    }

    /// Blocking [`check_access`](Self::check_access) for synchronous callers
    pub fn check_access_blocking(&self, timeout: Option<Duration>) -> AccessOutcome {
        run_blocking(self.check_access(timeout))
            .unwrap_or_else(|e| AccessOutcome::Unreachable(e.reason()))
    }

    // -------------------------------------------------------------------------
    // Subtitle listings
    // -------------------------------------------------------------------------

    /// Resolve `query` and list its subtitles
    pub async fn get_subtitles(&self, query: &SearchQuery) -> Vec<RemoteSubtitleResult> {
        let Some(catalog_id) = self
            .resolve_identifier(&query.title, query.kind, query.external_id.as_deref())
            .await
        else {
            return Vec::new();
        };

        match query.kind {
            MediaKind::Movie => self.movie_subtitles(&catalog_id).await,
            MediaKind::Series => match (query.season, query.episode) {
                (Some(season), Some(episode)) => {
                    self.series_subtitles(&catalog_id, season, episode).await
                }
                _ => {
                    warn!(title = %query.title, "Series search needs a season and an episode");
                    Vec::new()
                }
            },
        }
    }

    /// Movie subtitles. The movie page is only complete for logged-in users,
    /// so this authenticates first and reads the page in the same session.
    pub async fn movie_subtitles(&self, catalog_id: &str) -> Vec<RemoteSubtitleResult> {
        if !self.credentials.is_complete() {
            info!("Username or password not configured; movie subtitles need an account");
            return Vec::new();
        }

        info!(catalog_id, "Authenticating before movie subtitle search");
        let session = self.transport.fresh_session();
        if let AuthOutcome::Failed(reason) = self.authenticate_in(&session, &self.credentials).await {
            error!(catalog_id, %reason, "Cannot search movie subtitles without valid authentication");
            return Vec::new();
        }

        let path = format!("{}?ID={}", MOVIE_PATH, urlencoding::encode(catalog_id));
        self.listings(&session, &path, catalog_id).await
    }

    /// Episode subtitles; no account needed
    pub async fn series_subtitles(
        &self,
        catalog_id: &str,
        season: u32,
        episode: u32,
    ) -> Vec<RemoteSubtitleResult> {
        let path = format!(
            "{}&SeriesID={}&Season={}&Episode={}",
            SERIES_PATH,
            urlencoding::encode(catalog_id),
            season,
            episode
        );
        self.listings(&self.transport, &path, catalog_id).await
    }

    async fn listings(
        &self,
        transport: &HttpTransport,
        path: &str,
        catalog_id: &str,
    ) -> Vec<RemoteSubtitleResult> {
        match fetch_listings(transport, path).await {
            Ok(listings) => {
                info!(catalog_id, count = listings.len(), "Subtitles extracted");
                listings
                    .into_iter()
                    .map(|l| RemoteSubtitleResult::from_listing(l, catalog_id))
                    .collect()
            }
            Err(e) => {
                warn!(catalog_id, error = %e, "Ktuvit subtitle listing failed");
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Download
    // -------------------------------------------------------------------------

    /// Exchange a subtitle id for a single-use download token
    pub async fn request_download(&self, film_id: &str, subtitle_id: &str) -> Option<String> {
        match self.try_request_download(film_id, subtitle_id).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(film_id, subtitle_id, error = %e, "Ktuvit subtitle request failed");
                None
            }
        }
    }

    async fn try_request_download(&self, film_id: &str, subtitle_id: &str) -> Result<String> {
        let body = RequestBody::new(DownloadRequest {
            film_id,
            subtitle_id,
        });
        let response = self
            .transport
            .post_json(REQUEST_DOWNLOAD_PATH, &body)
            .await?
            .into_success_body()?;
        let result: DownloadResult = decode_envelope(&response)?;

        result
            .download_identifier
            .filter(|token| !token.is_empty())
            .ok_or_else(|| KtuvitError::NotFound(format!("no download token for {}", subtitle_id)))
    }

    /// Fetch the subtitle file behind a download token
    pub async fn fetch(&self, token: &str) -> Option<SubtitleArtifact> {
        info!(download_id = token, "Downloading subtitle file");
        match self.try_fetch(token).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(download_id = token, error = %e, "Ktuvit subtitle download failed");
                None
            }
        }
    }

    async fn try_fetch(&self, token: &str) -> Result<SubtitleArtifact> {
        let path = format!(
            "{}?DownloadIdentifier={}",
            DOWNLOAD_PATH,
            urlencoding::encode(token)
        );
        let mut response = self.transport.get_raw(&path).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KtuvitError::Status(status.as_u16()));
        }

        let mut buffer = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            buffer.extend_from_slice(&chunk);
        }
        debug!(bytes = buffer.len(), "Subtitle payload received");

        Ok(SubtitleArtifact::srt(buffer))
    }

    /// Token exchange followed by the file fetch
    pub async fn download(&self, film_id: &str, subtitle_id: &str) -> Option<SubtitleArtifact> {
        let token = self.request_download(film_id, subtitle_id).await?;
        self.fetch(&token).await
    }

    /// Download by the `{subtitle_id}:{film_id}` id carried on search results
    pub async fn download_by_id(&self, id: &str) -> Option<SubtitleArtifact> {
        match id.parse::<CompositeId>() {
            Ok(id) => self.download(&id.film_id, &id.subtitle_id).await,
            Err(e) => {
                warn!(error = %KtuvitError::InvalidId(e), "Cannot download subtitle");
                None
            }
        }
    }
}

async fn fetch_listings(transport: &HttpTransport, path: &str) -> Result<Vec<SubtitleListing>> {
    let html = transport.get_text(path, None).await?.into_success_body()?;
    Ok(extract_listings(&html))
}

/// Catalog id of the first film whose IMDb id matches
fn first_match<'a>(films: &'a [FilmMatch], external_id: &str) -> Option<&'a str> {
    films
        .iter()
        .find(|film| film.matches(external_id))
        .map(|film| film.catalog_id.as_str())
}

/// Session salt embedded in the home page script
fn extract_salt(html: &str) -> Option<&str> {
    ENCRYPTION_SALT
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}
