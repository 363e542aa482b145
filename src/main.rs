mod api;
mod app;
mod cache;
mod certificate;
mod commands;
mod config;
mod event;
mod fetcher;
mod list_query;
mod logging;
mod query;
mod records;
mod services;
mod session;
mod store;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

use crate::api::EfilingClient;
use crate::cache::ListCache;
use crate::services::Services;
use crate::session::Session;
use crate::store::{PersistedStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "efiling")]
#[command(about = "A terminal client for the E-Filing correspondence tracker")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/efiling/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overrides api.base_url
  #[arg(long)]
  base_url: Option<String>,

  /// Always fetch from the server; nothing is cached
  #[arg(long)]
  no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }
  if args.no_cache {
    config.cache.enabled = false;
  }

  let _log_guard = logging::init(&config)?;
  info!(base_url = %config.api.base_url, cache = config.cache.enabled, "starting");

  let store = PersistedStore::new(SqliteStore::open()?);
  let session = Session::new(store.clone());
  if let Some(token) = config::Config::env_token() {
    session.login(&token);
  }

  let cache_store = if config.cache.enabled {
    store
  } else {
    PersistedStore::disabled()
  };
  let cache = ListCache::new(cache_store, config.cache.ttl()).with_per_account(config.cache.per_account);

  let client = EfilingClient::new(&config.api.base_url)?;
  let services = Services::new(client, cache, session);

  let mut app = app::App::new(&config, services);
  app.run().await?;

  info!("exiting");
  Ok(())
}
