use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use url::Url;

pub type ItemId = u64;

lazy_static! {
    static ref PARAGRAPH_REGEX: Regex = Regex::new(r"(?i)<p\s*/?>").unwrap();
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemKind {
    Story,
    Comment,
    Job,
    Poll,
    PollOpt,
    #[default]
    Unknown,
}

impl ItemKind {
    fn from_api(kind: Option<&str>) -> Self {
        match kind {
            Some("story") => ItemKind::Story,
            Some("comment") => ItemKind::Comment,
            Some("job") => ItemKind::Job,
            Some("poll") => ItemKind::Poll,
            Some("pollopt") => ItemKind::PollOpt,
            _ => ItemKind::Unknown,
        }
    }
}

/// A snapshot of one Hacker News item (story, comment, job, ...).
///
/// `url_host` and `time_string_representation` are derived when the
/// snapshot is built and never recomputed; a later fetch produces a new
/// snapshot instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub title: Option<String>,
    pub url: Option<String>,
    pub url_host: Option<String>,
    pub score: Option<i64>,
    pub by: Option<String>,
    pub time: Option<i64>,
    pub time_string_representation: Option<String>,
    pub text: Option<String>,
    pub descendants: Option<i64>,
    pub parent: Option<ItemId>,
    pub kids: Vec<ItemId>,
    pub deleted: bool,
    pub dead: bool,
}

// Wire shape of https://hacker-news.firebaseio.com/v0/item/<id>.json
#[derive(Debug, Deserialize)]
struct ApiItem {
    id: ItemId,
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    url: Option<String>,
    score: Option<i64>,
    by: Option<String>,
    time: Option<i64>,
    text: Option<String>,
    descendants: Option<i64>,
    parent: Option<ItemId>,
    #[serde(default)]
    kids: Vec<ItemId>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    dead: bool,
}

impl From<ApiItem> for Item {
    fn from(api: ApiItem) -> Self {
        let url_host = api.url.as_deref().and_then(host_of);
        let time_string_representation = api.time.and_then(|t| time_ago_from_unix(t, Utc::now()));

        Self {
            id: api.id,
            kind: ItemKind::from_api(api.kind.as_deref()),
            title: api.title,
            url: api.url,
            url_host,
            score: api.score,
            by: api.by,
            time: api.time,
            time_string_representation,
            text: api.text,
            descendants: api.descendants,
            parent: api.parent,
            kids: api.kids,
            deleted: api.deleted,
            dead: api.dead,
        }
    }
}

impl Item {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            kind: ItemKind::Unknown,
            title: None,
            url: None,
            url_host: None,
            score: None,
            by: None,
            time: None,
            time_string_representation: None,
            text: None,
            descendants: None,
            parent: None,
            kids: Vec::new(),
            deleted: false,
            dead: false,
        }
    }

    /// Decodes an API payload. The API answers `null` for ids it does not know.
    pub fn from_json(body: &str) -> serde_json::Result<Option<Item>> {
        let api: Option<ApiItem> = serde_json::from_str(body)?;
        Ok(api.map(Item::from))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.url_host = host_of(&url);
        self.url = Some(url);
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_by(mut self, by: impl Into<String>) -> Self {
        self.by = Some(by.into());
        self
    }

    pub fn with_time(mut self, unix_secs: i64) -> Self {
        self.time = Some(unix_secs);
        self.time_string_representation = time_ago_from_unix(unix_secs, Utc::now());
        self
    }

    pub fn with_text(mut self, html: impl Into<String>) -> Self {
        self.text = Some(html.into());
        self
    }

    /// Plain-text rendering of the HTML body, cut to `max_chars` characters.
    pub fn text_preview(&self, max_chars: usize) -> Option<String> {
        let html = self.text.as_deref()?;

        let spaced = PARAGRAPH_REGEX.replace_all(html, " ");
        let stripped = TAG_REGEX.replace_all(&spaced, "");
        let decoded = html_escape::decode_html_entities(&stripped);
        let collapsed = WHITESPACE_REGEX.replace_all(decoded.trim(), " ");

        if collapsed.chars().count() <= max_chars {
            return Some(collapsed.into_owned());
        }

        let mut preview: String = collapsed.chars().take(max_chars).collect();
        preview.truncate(preview.trim_end().len());
        preview.push('…');
        Some(preview)
    }
}

/// Host part of `url` for display, without a leading `www.`.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn time_ago_from_unix(unix_secs: i64, now: DateTime<Utc>) -> Option<String> {
    let then = Utc.timestamp_opt(unix_secs, 0).single()?;
    Some(time_ago(then, now))
}

/// Formats the age of a post the way HN does ("3 hours ago").
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);

    let (value, unit) = match secs {
        0..=59 => (secs, "second"),
        60..=3_599 => (secs / 60, "minute"),
        3_600..=86_399 => (secs / 3_600, "hour"),
        86_400..=2_591_999 => (secs / 86_400, "day"),
        2_592_000..=31_535_999 => (secs / 2_592_000, "month"),
        _ => (secs / 31_536_000, "year"),
    };

    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}
