//! Opsdesk main entry point

use anyhow::Context;
use clap::Parser;
use opsdesk_api::{start_server, AppState};
use opsdesk_config::{Config, ConfigError};
use opsdesk_core::{
    ListController, ListKind, ListRegistry, ListView, MountedList, PageSizes, PageSource,
    RealtimeHub, TableRow,
};
use opsdesk_remote::{RemoteApi, RemoteSource};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "opsdesk")]
#[command(version = "0.1.0")]
#[command(about = "Operator back office for members, products and withdrawals", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Build the controller for `kind` over `source` and mount it on the hub
async fn mount<S>(
    kind: ListKind,
    source: S,
    hub: &Arc<RealtimeHub>,
    config: &Config,
) -> Arc<dyn ListView>
where
    S: PageSource + 'static,
    S::Row: TableRow + Serialize,
{
    let controller = Arc::new(ListController::new(
        kind.as_str(),
        Arc::new(source),
        kind.filter_schema(),
        PageSizes::new(&config.pagination.page_sizes),
        config.pagination.default_limit,
    ));
    let view = MountedList::mount(
        kind,
        controller,
        hub.clone(),
        kind.realtime_events(&config.realtime),
        config.realtime.debounce(),
    )
    .await;
    Arc::new(view)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, missing) = match Config::load(args.config.clone()) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound { .. }) => (Config::default(), true),
        Err(e) => {
            return Err(e).with_context(|| format!("loading {}", args.config.display()));
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if missing {
        log::warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
    }
    log::info!("Remote API: {}", config.remote.base_url);

    let api = Arc::new(RemoteApi::new(&config.remote));
    let hub = Arc::new(RealtimeHub::new());

    match (&config.remote.token, config.realtime.enabled) {
        (_, false) => log::info!("Realtime refresh disabled"),
        (Some(token), true) if !token.trim().is_empty() => {
            if let Err(e) = hub.connect(token) {
                log::warn!("Realtime channel not connected: {}", e);
            }
        }
        _ => log::warn!("No remote token configured; realtime refresh is off"),
    }
    if !api.has_token() {
        log::warn!("Remote calls will be sent without an Authorization header");
    }

    let mut lists = ListRegistry::new();
    lists.insert(mount(ListKind::Members, RemoteSource::members(api.clone()), &hub, &config).await);
    lists.insert(mount(ListKind::Products, RemoteSource::products(api.clone()), &hub, &config).await);
    lists.insert(
        mount(ListKind::Withdrawals, RemoteSource::withdrawals(api.clone()), &hub, &config).await,
    );

    let state = AppState {
        config: Arc::new(config),
        hub,
        lists: Arc::new(lists),
        actions: api,
    };

    start_server(state).await
}
