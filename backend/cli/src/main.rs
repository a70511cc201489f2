use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use tabsplit_config::{redact_opt, AppConfig};
use tabsplit_core::{BillStore, IconGenerator, IconStore};
use tabsplit_gateway::{start_server, AppState, RateLimiter};
use tabsplit_icons::{IconService, MemoryIconStore, OpenAiImages, SupabaseIconStore};
use tabsplit_store::{MemoryBillStore, SupabaseBillStore};
use tabsplit_vision::{OpenAiVision, ScanCache, Scanner};

#[derive(Parser)]
#[command(name = "tabsplit")]
#[command(about = "tabsplit: receipt scanning and bill splitting backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the tabsplit HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show current server status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    logging::init_logger(&config.log_dir, &config.log_level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = AppConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("tabsplit is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        supabase = config.has_database(),
        openai = %redact_opt(config.openai_api_key.as_deref()),
        "starting tabsplit"
    );

    let store: Arc<dyn BillStore> = match (&config.supabase_url, &config.supabase_service_key) {
        (Some(url), Some(key)) => Arc::new(SupabaseBillStore::new(url.clone(), key.clone())),
        _ => {
            warn!("SUPABASE_URL/SUPABASE_SERVICE_KEY not set; bills live in memory only");
            Arc::new(MemoryBillStore::new())
        }
    };

    let scanner = config.openai_api_key.as_ref().map(|key| {
        let reader = OpenAiVision::new(key.clone(), config.vision_model.clone());
        let cache = ScanCache::new(
            config.scan_cache_capacity,
            Duration::from_secs(config.scan_cache_ttl_secs),
        );
        Arc::new(Scanner::new(
            Arc::new(reader),
            cache,
            Duration::from_millis(config.scan_timeout_ms),
        ))
    });
    if scanner.is_none() {
        warn!("OPENAI_API_KEY not set; scan endpoints will answer NOT_CONFIGURED");
    }

    let icons = config.openai_api_key.as_ref().map(|key| {
        let generator: Arc<dyn IconGenerator> = Arc::new(OpenAiImages::new(key.clone()));
        let icon_store: Arc<dyn IconStore> =
            match (&config.supabase_url, &config.supabase_service_key) {
                (Some(url), Some(service_key)) => {
                    Arc::new(SupabaseIconStore::new(url.clone(), service_key.clone()))
                }
                _ => Arc::new(MemoryIconStore::new(config.icon_cache_capacity)),
            };
        Arc::new(IconService::new(icon_store, generator))
    });

    let state = Arc::new(AppState {
        store,
        scanner,
        icons,
        rate_limiter: RateLimiter::new(config.rate_limit_max, config.rate_limit_window_secs),
    });

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port).parse()?;
    start_server(addr, state).await
}
