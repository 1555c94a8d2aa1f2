//! ktuvit-subs - Hebrew subtitles from Ktuvit.me
//!
//! # Usage
//!
//! ```bash
//! ktuvit-subs search "Breaking Bad" --imdb tt0903747 --series -s 1 -e 5
//! ktuvit-subs download AABBCCDDEEFF00112233445566778899:1234
//! ktuvit-subs validate --json
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ktuvit_subs::api::KtuvitClient;
use ktuvit_subs::cli::{Cli, Command, ExitCode, Output};
use ktuvit_subs::commands;
use ktuvit_subs::config::Config;
use ktuvit_subs::engine::EngineCell;

static ENGINE: EngineCell = EngineCell::new();

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    run_cli(cli).await.into()
}

/// Logs go to stderr so stdout stays parseable
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config_path = cli.config.clone().or_else(Config::path);
    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
        },
        None => Config::load(),
    }
    .with_env_overrides();

    let engine = ENGINE.initialize_with(|| KtuvitClient::from_config(&config));

    match cli.command {
        Command::Search(cmd) => {
            if let Err(e) = ktuvit_subs::cli::validate_imdb_id(&cmd.imdb) {
                return output.error(e, ExitCode::InvalidArgs);
            }
            commands::search_cmd(cmd, &engine, &output).await
        }

        Command::Resolve(cmd) => {
            if let Err(e) = ktuvit_subs::cli::validate_imdb_id(&cmd.imdb) {
                return output.error(e, ExitCode::InvalidArgs);
            }
            commands::resolve_cmd(cmd, &engine, &output).await
        }

        Command::Download(cmd) => commands::download_cmd(cmd, &engine, &output).await,

        // Validation blocks on the remote checks
        Command::Validate(cmd) => tokio::task::block_in_place(|| {
            commands::validate_cmd(cmd, &config, ENGINE.get().as_deref(), &output)
        }),

        Command::Config(cmd) => commands::config_cmd(cmd, &config, config_path, &output),
    }
}
