use log::{debug, info};
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

use crate::error::Result;
use crate::fetcher::{FetchHandle, ItemFetcher};
use crate::models::{Item, ItemId};

/// Display lifecycle of one item card.
///
/// `Failed` presents exactly like `Unloaded`: the card keeps its
/// placeholders and the next appearance tries again.
#[derive(Debug, Clone, PartialEq)]
pub enum CellState {
    Unloaded,
    Loading,
    Loaded(Arc<Item>),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardText {
    pub text: String,
    pub redacted: bool,
}

impl CardText {
    fn shown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            redacted: false,
        }
    }

    fn placeholder(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            redacted: true,
        }
    }
}

impl fmt::Display for CardText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.redacted {
            let width = self.text.chars().count().max(3);
            write!(f, "{}", "░".repeat(width))
        } else {
            write!(f, "{}", self.text)
        }
    }
}

/// What a card shows for its current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCard {
    pub title: CardText,
    pub host: CardText,
    pub score: CardText,
    pub author: CardText,
    pub age: CardText,
    /// Plain-text excerpt of a text post's body.
    pub preview: Option<String>,
}

const PREVIEW_CHARS: usize = 160;

impl ItemCard {
    pub fn placeholder() -> Self {
        Self {
            title: CardText::placeholder("No title"),
            host: CardText::placeholder("No url"),
            score: CardText::placeholder("0"),
            author: CardText::placeholder("No author"),
            age: CardText::placeholder(""),
            preview: None,
        }
    }

    pub fn for_item(item: &Item) -> Self {
        Self {
            title: CardText::shown(item.title.as_deref().unwrap_or("No title")),
            host: CardText::shown(item.url_host.as_deref().unwrap_or("")),
            score: CardText::shown(item.score.unwrap_or(0).to_string()),
            author: CardText::shown(item.by.as_deref().unwrap_or("anonymous")),
            age: CardText::shown(item.time_string_representation.as_deref().unwrap_or("")),
            preview: item.text_preview(PREVIEW_CHARS),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.title.redacted
    }
}

impl fmt::Display for ItemCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.host)?;
        if let Some(preview) = &self.preview {
            writeln!(f, "{}", preview)?;
        }
        write!(f, "{} • Posted by {} • {}", self.score, self.author, self.age)
    }
}

/// Consumer side of a fetch: one card bound to one item id.
pub struct ItemCell {
    item_id: ItemId,
    state: Arc<Mutex<CellState>>,
    in_flight: Option<FetchHandle>,
}

fn lock_state(state: &Mutex<CellState>) -> MutexGuard<'_, CellState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ItemCell {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            state: Arc::new(Mutex::new(CellState::Unloaded)),
            in_flight: None,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn state(&self) -> CellState {
        lock_state(&self.state).clone()
    }

    pub fn item(&self) -> Option<Arc<Item>> {
        match &*lock_state(&self.state) {
            CellState::Loaded(item) => Some(Arc::clone(item)),
            _ => None,
        }
    }

    /// Loaded or failed; nothing more will happen until the next appearance.
    pub fn is_settled(&self) -> bool {
        matches!(*lock_state(&self.state), CellState::Loaded(_) | CellState::Failed)
    }

    /// Display-time trigger. Starts a fetch unless one is running or the
    /// item is already loaded. Returns whether a fetch was started.
    pub fn on_appear(&mut self, fetcher: &ItemFetcher) -> bool {
        {
            let mut state = lock_state(&self.state);
            match *state {
                CellState::Loading | CellState::Loaded(_) => return false,
                CellState::Unloaded | CellState::Failed => *state = CellState::Loading,
            }
        }

        let item_id = self.item_id;
        let weak_state = Arc::downgrade(&self.state);
        let handle = fetcher.fetch(item_id, move |item| {
            let Some(state) = weak_state.upgrade() else {
                debug!("Cell for item {} is gone, ignoring result", item_id);
                return;
            };
            *lock_state(&state) = match item {
                Some(item) => CellState::Loaded(item),
                None => CellState::Failed,
            };
        });

        self.in_flight = Some(handle);
        true
    }

    pub fn card(&self) -> ItemCard {
        match &*lock_state(&self.state) {
            CellState::Loaded(item) => ItemCard::for_item(item),
            CellState::Unloaded | CellState::Loading | CellState::Failed => ItemCard::placeholder(),
        }
    }

    /// Opens the item's url in the system handler. Does nothing for
    /// unloaded cells and text-only posts.
    pub fn activate(&self) -> Result<bool> {
        self.activate_with(|url| open::that(url.as_str()))
    }

    pub fn activate_with<F>(&self, opener: F) -> Result<bool>
    where
        F: FnOnce(&Url) -> io::Result<()>,
    {
        let Some(item) = self.item() else {
            return Ok(false);
        };
        let Some(raw_url) = item.url.as_deref() else {
            return Ok(false);
        };

        let url = Url::parse(raw_url)?;
        opener(&url)?;
        info!("Opened {} for item {}", url, self.item_id);
        Ok(true)
    }
}

impl Drop for ItemCell {
    fn drop(&mut self) {
        if let Some(handle) = &self.in_flight {
            handle.cancel();
        }
    }
}
