mod api;
mod config;
mod config_cmd;
mod narrate_cmd;
mod normalize_cmd;
mod sections_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use papervoice_markdown::RenderOptions;
use papervoice_section::SectionSelector;
use tokio::net::TcpListener;
use tracing::info;

use api::AppState;
use config::Config;

#[derive(Parser)]
#[command(name = "papervoice")]
#[command(about = "papervoice: spoken explanations of research papers")]
#[command(version)]
struct Cli {
    /// Config file (default: $PAPERVOICE_CONFIG_DIR/config.yaml or ~/.papervoice/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the spoken form of a markdown answer (file or stdin)
    Normalize {
        file: Option<PathBuf>,
        /// Drop citations and URLs
        #[arg(long)]
        strip_citations: bool,
    },
    /// Render a markdown answer to HTML with tagged math spans
    Render {
        file: Option<PathBuf>,
        /// Escape raw HTML instead of passing it through
        #[arg(long)]
        escape_html: bool,
        /// Leave math spans empty instead of carrying the LaTeX source
        #[arg(long)]
        no_latex: bool,
    },
    /// List the explainable sections of a saved paper page
    Sections {
        page: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Explain one section of a saved paper page aloud
    Explain {
        page: PathBuf,
        /// Section index or element id
        #[arg(short, long)]
        section: SectionSelector,
        /// Audio output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the explanation and its spoken text instead of synthesizing audio
        #[arg(long)]
        text_only: bool,
    },
    /// Read a whole markdown paper aloud into one audio file
    Narrate {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the planned chunks without calling the speech endpoint
        #[arg(long)]
        dry_run: bool,
    },
    /// Start the HTTP API for the page script
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check whether a local server is running
    Status,
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Write a config file with every default filled in
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            terminal_output::note_error(&papervoice_logging::redact_sensitive_data(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = Config::path(cli.config);

    // `config` subcommands must work even when the file does not validate.
    if let Commands::Config { action } = &cli.command {
        papervoice_logging::init_console_logger("warn", false);
        return match action {
            ConfigAction::Show => config_cmd::show(&path).await,
            ConfigAction::Init { force } => config_cmd::init(&path, *force).await,
            ConfigAction::Path => {
                println!("{}", path.display());
                Ok(())
            }
        };
    }

    // Commands print their results on stdout; only the server narrates at info.
    let default_level = match cli.command {
        Commands::Serve { .. } => papervoice_config::defaults::DEFAULT_LOG_LEVEL,
        _ => "warn",
    };
    init_logging(&path, default_level).await;
    let config = Config::from_file(papervoice_config::load_and_prepare(&path).await?)?;

    match cli.command {
        Commands::Normalize { file, strip_citations } => {
            let options = papervoice_speech::NormalizeOptions {
                strip_citations: strip_citations || config.normalize.strip_citations,
                ..config.normalize
            };
            normalize_cmd::run(file.as_deref(), options).await
        }
        Commands::Render {
            file,
            escape_html,
            no_latex,
        } => {
            let options = RenderOptions {
                html_tags: !escape_html,
                include_latex: !no_latex,
            };
            normalize_cmd::render(file.as_deref(), options).await
        }
        Commands::Sections { page, json } => sections_cmd::list(&page, json).await,
        Commands::Explain {
            page,
            section,
            output,
            text_only,
        } => sections_cmd::explain(&config, &page, &section, output, text_only).await,
        Commands::Narrate { file, output, dry_run } => narrate_cmd::run(&config, &file, output, dry_run).await,
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await
        }
        Commands::Status => status(&config).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Logging comes from the raw file so config warnings are not lost; `RUST_LOG` wins.
async fn init_logging(path: &std::path::Path, default_level: &str) {
    let logging = papervoice_config::load_config(path)
        .await
        .ok()
        .and_then(|raw| raw.logging)
        .unwrap_or_default();
    let level = logging.level.as_deref().unwrap_or(default_level);
    match logging.dir {
        Some(dir) => papervoice_logging::init_logger(dir, level),
        None => papervoice_logging::init_console_logger(level, logging.json.unwrap_or(false)),
    }
}

async fn status(config: &Config) -> Result<()> {
    let url = format!("http://{}:{}/api/health", config.bind_address, config.port);
    match reqwest::get(&url).await {
        Ok(resp) => {
            let body: serde_json::Value = resp.json().await.context("Unexpected health response")?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => println!("papervoice is not running on port {}", config.port),
    }
    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    let pipeline = config.pipeline()?;
    let state = Arc::new(AppState::new(pipeline, config.normalize));
    let app = api::build_router(state).layer(api::cors_layer(&config.allowed_origins));

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, model = %config.explain.model, voice = %config.voice, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")
}
