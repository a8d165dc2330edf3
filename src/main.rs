use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};

use callcenter_chat::{config::Config, routes, state::AppState, terminal};

#[derive(Parser, Debug)]
#[command(author, version, about = "CallCenterAI ticket chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the relay: /api/prompt, /api/health and static files
    Serve {
        /// Listen address (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Upstream model URL (overrides MODEL_API_URL)
        #[arg(long)]
        model_url: Option<String>,

        /// Directory served for non-API paths (overrides STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Interactive ticket chat against a running relay
    Chat {
        /// Relay base URL (overrides ROUTER_BASE_URL)
        #[arg(long)]
        router: Option<String>,

        /// Guess the model from the ticket text when the response omits it
        #[arg(long)]
        legacy_model_guess: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callcenter_chat=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("invalid configuration")?;
    cli.command.apply_to(&mut config);

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::Chat { .. } => terminal::run_chat(&config).await,
    }
}

impl Command {
    /// Command-line flags take precedence over the environment.
    fn apply_to(&self, config: &mut Config) {
        match self {
            Command::Serve { bind, model_url, static_dir } => {
                if let Some(bind) = bind {
                    config.bind_addr = *bind;
                }
                if model_url.is_some() {
                    config.model_api_url = model_url.clone();
                }
                if let Some(dir) = static_dir {
                    config.static_dir = dir.clone();
                }
            }
            Command::Chat { router, legacy_model_guess } => {
                if let Some(router) = router {
                    config.router_base_url = router.trim_end_matches('/').to_string();
                }
                config.legacy_model_guess |= *legacy_model_guess;
            }
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let model_url = config.require_model_api_url()?.to_string();
    let state = Arc::new(AppState::from_config(&config).context("failed to build HTTP client")?);
    let app = routes::create_router(&config.static_dir).with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, model = %model_url, "relay listening");
    axum::serve(listener, app).await?;
    Ok(())
}
