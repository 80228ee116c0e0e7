use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hn_items::{Config, HackerNewsClient, ItemCache, ItemCell, ItemFetcher, ItemId, MainContext};

#[derive(Parser, Debug)]
#[command(name = "hn-items", version, about = "Fetch Hacker News items and print them as cards")]
struct Cli {
    /// Item ids to fetch
    ids: Vec<ItemId>,

    /// Also fetch the first N top stories
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Request timeout in seconds (overrides HN_REQUEST_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Open the first loaded item that has a link
    #[arg(long)]
    open: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(secs) = cli.timeout_secs {
        config
            .set_request_timeout_secs(secs)
            .context("Invalid --timeout-secs")?;
    }

    let client = Arc::new(HackerNewsClient::from_config(&config).context("Failed to create HTTP client")?);

    let mut ids = cli.ids.clone();
    if let Some(limit) = cli.top {
        let top = client.top_story_ids(limit).context("Failed to load top stories")?;
        info!("Loaded {} top story ids", top.len());
        ids.extend(top);
    }
    if ids.is_empty() {
        bail!("No item ids given; pass ids or --top N");
    }

    let ctx = MainContext::new();
    let fetcher = ItemFetcher::new(ItemCache::with_capacity(config.cache_capacity), client, ctx.dispatcher());

    let mut cells: Vec<ItemCell> = ids.into_iter().map(ItemCell::new).collect();
    for cell in &mut cells {
        cell.on_appear(&fetcher);
    }

    // Drive the main loop until every card has settled or the lookups have had their chance.
    let deadline = Instant::now().checked_add(config.lookup_budget());
    while !cells.iter().all(ItemCell::is_settled) {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            warn!("Gave up waiting for some items; showing placeholders");
            break;
        }
        ctx.run_pending_timeout(Duration::from_millis(100));
    }

    for cell in &cells {
        println!("#{}\n{}\n", cell.item_id(), cell.card());
    }

    if cli.open {
        match cells.iter().find(|cell| cell.item().is_some_and(|item| item.url.is_some())) {
            Some(cell) => {
                cell.activate().context("Failed to open item link")?;
            }
            None => warn!("No loaded item has a link to open"),
        }
    }

    Ok(())
}
