use log::{debug, warn};
use reqwest::blocking::Client;

use crate::config::Config;
use crate::error::{HnError, Result};
use crate::models::{Item, ItemId};

/// Remote lookup primitive used by the fetcher.
///
/// `Ok(None)` means the origin answered but has no such item.
pub trait ItemDownloader: Send + Sync + 'static {
    fn download_item(&self, id: ItemId) -> Result<Option<Item>>;
}

#[derive(Clone)]
pub struct HackerNewsClient {
    client: Client,
    api_base: String,
}

impl HackerNewsClient {
    pub fn new() -> Result<Self> {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn item_url(&self, id: ItemId) -> String {
        format!("{}/v0/item/{}.json", self.api_base, id)
    }

    fn get_body(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(HnError::Status(status.as_u16()));
        }

        Ok(response.text()?)
    }

    pub fn fetch_item(&self, id: ItemId) -> Result<Option<Item>> {
        let body = self.get_body(&self.item_url(id))?;

        match Item::from_json(&body)? {
            Some(item) if item.id != id => {
                warn!("Requested item {} but the API answered with item {}", id, item.id);
                Ok(None)
            }
            item => Ok(item),
        }
    }

    /// Ids of the current front page, best first.
    pub fn top_story_ids(&self, limit: usize) -> Result<Vec<ItemId>> {
        let url = format!("{}/v0/topstories.json", self.api_base);
        let body = self.get_body(&url)?;

        let mut ids: Vec<ItemId> = serde_json::from_str(&body)?;
        ids.truncate(limit);
        debug!("Loaded {} top story ids", ids.len());
        Ok(ids)
    }
}

impl ItemDownloader for HackerNewsClient {
    fn download_item(&self, id: ItemId) -> Result<Option<Item>> {
        self.fetch_item(id)
    }
}
