//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the engine.
//! Each handler takes CLI args and Output, returns ExitCode.

use std::path::PathBuf;

use crate::api::KtuvitClient;
use crate::cli::{
    ConfigCmd, ConfigView, DownloadCmd, ExitCode, Output, ResolveCmd, ResolvedId, SavedSubtitle,
    SearchCmd, StatusOk, ValidateCmd,
};
use crate::config::{Config, ConfigError, EDITOR_DESCRIPTION, EDITOR_TITLE};
use crate::models::CompositeId;

// =============================================================================
// Search Command
// =============================================================================

pub async fn search_cmd(cmd: SearchCmd, engine: &KtuvitClient, output: &Output) -> ExitCode {
    if let Err(e) = cmd.validate() {
        return output.error(e, ExitCode::InvalidArgs);
    }

    let query = cmd.query();
    output.info(format!(
        "Searching subtitles for: {} ({}, {})",
        query.title, cmd.imdb, query.kind
    ));

    let mut results = engine.get_subtitles(&query).await;
    if results.is_empty() {
        return output.error("No subtitles found", ExitCode::NotFound);
    }

    results.truncate(cmd.limit);

    if let Err(e) = output.print(&results) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(cmd: ResolveCmd, engine: &KtuvitClient, output: &Output) -> ExitCode {
    output.info(format!("Resolving: {} ({})", cmd.title, cmd.imdb));

    match engine
        .resolve_identifier(&cmd.title, cmd.kind(), Some(&cmd.imdb))
        .await
    {
        Some(catalog_id) => {
            let resolved = ResolvedId {
                title: cmd.title,
                imdb_id: cmd.imdb,
                catalog_id,
            };
            if let Err(e) = output.print(&resolved) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        None => output.error(
            format!("No Ktuvit entry matches {}", cmd.imdb),
            ExitCode::NotFound,
        ),
    }
}

// =============================================================================
// Download Command
// =============================================================================

pub async fn download_cmd(cmd: DownloadCmd, engine: &KtuvitClient, output: &Output) -> ExitCode {
    // Reject malformed ids before any request; the subtitle part names the file
    let id: CompositeId = match cmd.id.parse() {
        Ok(id) => id,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };

    output.info(format!("Downloading subtitle {}", id.subtitle_id));

    let Some(artifact) = engine.download_by_id(&cmd.id).await else {
        return output.error(
            format!("Subtitle {} could not be downloaded", id.subtitle_id),
            ExitCode::NetworkError,
        );
    };

    let path = cmd.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}.{}",
            id.subtitle_id,
            artifact.language,
            artifact.format.extension()
        ))
    });

    let saved = SavedSubtitle {
        path: path.clone(),
        bytes: artifact.len(),
        language: artifact.language.clone(),
        format: artifact.format.extension().to_string(),
    };

    if let Err(e) = std::fs::write(&path, artifact.into_bytes()) {
        return output.error(
            format!("Failed to write {}: {}", path.display(), e),
            ExitCode::Error,
        );
    }

    if let Err(e) = output.print(&saved) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Validate Command
// =============================================================================

pub fn validate_cmd(
    cmd: ValidateCmd,
    config: &Config,
    engine: Option<&KtuvitClient>,
    output: &Output,
) -> ExitCode {
    let result = if cmd.offline {
        config.validate()
    } else {
        output.info("Checking Ktuvit.me access and credentials...");
        config.validate_remote(engine)
    };

    match result {
        Ok(()) => {
            if let Err(e) = output.print(StatusOk::default()) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => {
            let code = match e {
                ConfigError::InvalidTimeout(_) | ConfigError::NotInitialized => ExitCode::InvalidArgs,
                ConfigError::Unreachable(_) => ExitCode::NetworkError,
                ConfigError::AuthenticationFailed(_) => ExitCode::AuthFailed,
            };
            output.error(e.to_string(), code)
        }
    }
}

// =============================================================================
// Config Command
// =============================================================================

pub fn config_cmd(
    cmd: ConfigCmd,
    config: &Config,
    path: Option<PathBuf>,
    output: &Output,
) -> ExitCode {
    if cmd.init {
        let Some(target) = path.as_deref() else {
            return output.error("Could not determine config path", ExitCode::Error);
        };
        if target.exists() {
            return output.error(
                format!("{} already exists", target.display()),
                ExitCode::InvalidArgs,
            );
        }
        if let Err(e) = Config::template().save_to(target) {
            return output.error(format!("{:#}", e), ExitCode::Error);
        }
        output.info(format!("Wrote {}", target.display()));
    }

    let credentials = config.credentials();
    let view = ConfigView {
        title: EDITOR_TITLE.to_string(),
        description: EDITOR_DESCRIPTION.to_string(),
        path,
        username: (!credentials.username.is_empty()).then(|| credentials.username.clone()),
        password_set: !credentials.password.is_empty(),
        request_timeout: config.request_timeout,
    };

    if let Err(e) = output.print(&view) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}
