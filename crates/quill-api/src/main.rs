//! quill server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `QUILL_*` environment variables, opens the SQLite store and the
//! configured cache, and serves the comment API over HTTP.
//!
//! # Token generation
//!
//! To mint a token for local testing:
//!
//! ```
//! cargo run -p quill-api --bin server -- --issue-token alice
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, bail};
use clap::Parser;
use quill_api::{AppState, CacheBackend, ServerConfig, TokenKeys};
use quill_cache::{CacheProvider, MemoryCache, RedisCache};
use quill_core::{cache::NoopCache, service::CommentService};
use quill_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// How often the in-process cache is swept for expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(author, version, about = "Quill comment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Drop and recreate the comment schema before serving.
  #[arg(long)]
  reset: bool,

  /// Remove every cached comment list before serving.
  #[arg(long)]
  flush_cache: bool,

  /// Print a one-hour access token for the given user id and exit.
  #[arg(long, value_name = "USER_ID")]
  issue_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("QUILL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.jwt_secret.is_empty() {
    bail!("jwt_secret is empty; set it in the config file or QUILL_JWT_SECRET");
  }
  let keys = TokenKeys::new(&server_cfg.jwt_secret);

  // Helper mode: mint a token and exit.
  if let Some(user_id) = cli.issue_token {
    println!("{}", keys.issue(&user_id, 3600)?);
    return Ok(());
  }

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  if cli.reset {
    store.reset().await.context("failed to reset store")?;
  }

  let cache = Arc::new(open_cache(&server_cfg).await?);
  tracing::info!(backend = cache.name(), "cache ready");
  if matches!(*cache, CacheProvider::Memory(_)) {
    tokio::spawn(sweep_expired(Arc::clone(&cache)));
  }

  let mut service = CommentService::new(Arc::new(store), cache);
  if let Some(ms) = server_cfg.op_timeout_ms {
    service = service.with_deadline(Duration::from_millis(ms));
  }

  if cli.flush_cache {
    let removed = service.purge_cache().await.context("failed to flush cache")?;
    tracing::info!(removed, "flushed cached comment lists");
  }

  // Build application state.
  let state = AppState { service, auth: Arc::new(keys) };

  let app = quill_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn open_cache(cfg: &ServerConfig) -> anyhow::Result<CacheProvider> {
  Ok(match cfg.cache_backend {
    CacheBackend::Redis => {
      let url = cfg
        .redis_url
        .as_deref()
        .context("cache_backend = \"redis\" requires redis_url")?;
      let cache = RedisCache::connect(url)
        .await
        .with_context(|| format!("failed to connect to redis at {url}"))?;
      cache.ping().await.context("redis did not answer PING")?;
      cache.into()
    }
    CacheBackend::Memory => MemoryCache::new().into(),
    CacheBackend::None => NoopCache.into(),
  })
}

/// Periodically drop expired entries from an in-process cache.
async fn sweep_expired(cache: Arc<CacheProvider>) {
  let mut tick = tokio::time::interval(SWEEP_INTERVAL);
  loop {
    tick.tick().await;
    if let CacheProvider::Memory(memory) = &*cache {
      let evicted = memory.evict_expired();
      if evicted > 0 {
        tracing::debug!(evicted, "evicted expired cache entries");
      }
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
