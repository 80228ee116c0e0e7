pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetcher;
pub mod hn_client;
pub mod item_cell;
pub mod models;

#[cfg(test)]
mod testing;

pub use cache::ItemCache;
pub use config::Config;
pub use dispatch::{Dispatcher, MainContext};
pub use error::{HnError, Result};
pub use fetcher::{FetchHandle, ItemFetcher};
pub use hn_client::{HackerNewsClient, ItemDownloader};
pub use item_cell::{CardText, CellState, ItemCard, ItemCell};
pub use models::{Item, ItemId, ItemKind};
