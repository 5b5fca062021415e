use arabic_relay::config::config_search_paths;
use arabic_relay::{build_router, AppState, RelayConfig, SharedLogger};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "arabic-relay",
    about = "Translate English content to Modern Standard Arabic through an LLM completion API",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Log file path
    #[arg(long, default_value = "arabic-relay.log")]
    log_file: PathBuf,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arabic_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let mut config = RelayConfig::find_and_load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    // Secrets are read once here and never again.
    let credentials = config.resolve_credentials()?;
    let logger = SharedLogger::new(&cli.log_file)?;

    info!("arabic-relay v{}", env!("CARGO_PKG_VERSION"));
    info!("  Upstream:  {}", config.upstream.completions_url());
    info!("  Model:     {}", config.upstream.model);
    info!("  Schema:    {:?}", config.prompt.schema);
    info!("  Port:      {}", config.port);
    info!("  Log file:  {}", cli.log_file.display());
    if credentials.basic_auth.is_some() {
        info!("  Auth:      basic");
    } else {
        warn!(
            "  Auth:      disabled ({} / {} not set)",
            config.auth.username_env, config.auth.password_env
        );
    }

    logger.info(
        "startup",
        format!(
            "Starting arabic-relay upstream={} model={} port={}",
            config.upstream.base_url, config.upstream.model, config.port
        ),
    );

    let mut client = reqwest::Client::builder();
    if let Some(secs) = config.upstream.timeout_secs {
        client = client.timeout(std::time::Duration::from_secs(secs));
    }
    let client = client.build()?;

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        credentials,
        client,
        logger,
    });

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Server listening at http://localhost:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
