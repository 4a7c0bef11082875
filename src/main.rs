//! Lawdio server — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI args
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Open the notes store (creates the directory)
//!   7. Build the provider from config + `LLM_API_KEY`
//!   8. Spawn Ctrl-C → shutdown signal watcher
//!   9. Serve until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use lawdio_server::{config, error, gateway, logger, server, storage};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    logger::init(effective_log_level, force_cli_level)?;

    info!(
        bind = %config.bind_addr(),
        notes_dir = %config.storage.notes_dir.display(),
        provider = %config.llm.provider,
        speech_enabled = %config.speech.enabled,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let store = storage::DirStore::open(&config.storage.notes_dir)?;

    let provider = gateway::build(&config.llm, &config.speech, config.llm_api_key.clone())
        .map_err(|e| error::AppError::Config(e.to_string()))?;

    // Shared shutdown token — Ctrl-C cancels it, the server loop watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let state = server::AppState {
        provider,
        store: Arc::new(store),
        speech: server::SpeechPolicy {
            enabled: config.speech.enabled,
            require_audio: config.speech.require_audio,
        },
    };
    let router = server::build_router(state, &config.server.public_dir);

    print_startup_summary(&config);

    server::serve(&config.bind_addr(), router, shutdown).await
}

fn print_startup_summary(config: &config::Config) {
    println!("Lawdio server");
    println!("  listen:  http://{}", config.bind_addr());
    println!("  notes:   {}", config.storage.notes_dir.display());
    println!("  public:  {}", config.server.public_dir.display());
    println!(
        "  llm:     provider={} model={} timeout={}s",
        config.llm.provider, config.llm.openai.model, config.llm.openai.timeout_seconds
    );
    if config.speech.enabled {
        println!(
            "  speech:  model={} voice={} require_audio={}",
            config.speech.model, config.speech.voice, config.speech.require_audio
        );
    } else {
        println!("  speech:  disabled");
    }
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: lawdio-server [OPTIONS]");
                println!("");
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier from the config default:
    //   -v      → warn   (suppress info noise, show warnings+errors only)
    //   -vv     → info   (normal operational output)
    //   -vvv    → debug  (flow-level diagnostics)
    //   -vvvv+  → trace  (full payload dumps, very verbose)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}
