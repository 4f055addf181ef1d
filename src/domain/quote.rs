//! Domain types representing quotes and the raw records the remote source returns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{QuoteError, Result};

/// Author recorded when none is supplied.
pub const DEFAULT_AUTHOR: &str = "Unknown";
/// Author recorded for quotes typed in by the user.
pub const USER_AUTHOR: &str = "User";
/// Category stamped on every remote-origin quote.
pub const REMOTE_CATEGORY: &str = "Server";
/// Author stamped on every remote-origin quote.
pub const REMOTE_AUTHOR: &str = "API";

/// A short text record keyed by its `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub category: String,
    #[serde(default = "default_author")]
    pub author: String,
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

impl Quote {
    /// Builds a validated quote from user-facing input.
    ///
    /// Text and category are trimmed and must be non-empty; a blank author falls
    /// back to [`DEFAULT_AUTHOR`].
    pub fn new(
        text: impl AsRef<str>,
        category: impl AsRef<str>,
        author: Option<&str>,
    ) -> Result<Self> {
        let text = text.as_ref().trim();
        let category = category.as_ref().trim();
        if text.is_empty() {
            return Err(QuoteError::Validation("quote text is required".into()));
        }
        if category.is_empty() {
            return Err(QuoteError::Validation("quote category is required".into()));
        }
        let author = author
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_AUTHOR);
        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
            author: author.to_string(),
        })
    }

    /// Identity key used for deduplication.
    pub fn key(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" - {} ({})", self.text, self.author, self.category)
    }
}

/// Raw record shape returned by the remote source (a `/posts` style resource).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One element of a fetched batch: a decoded record, or the reason it could not be decoded.
pub type RawEntry = Result<RawRecord>;

impl RawRecord {
    /// Decodes a single batch element. Off-type fields or non-object values are malformed.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let id = value.get("id").and_then(serde_json::Value::as_u64);
        serde_json::from_value(value).map_err(|err| {
            QuoteError::MalformedRecord(match id {
                Some(id) => format!("record {id} could not be decoded: {err}"),
                None => format!("record could not be decoded: {err}"),
            })
        })
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl From<&Quote> for RawRecord {
    fn from(quote: &Quote) -> Self {
        Self {
            title: Some(quote.text.clone()),
            body: Some(quote.category.clone()),
            text: Some(quote.text.clone()),
            ..Self::default()
        }
    }
}

/// Maps a remote record into a quote using the remote-origin conventions.
///
/// An explicit `text` field takes priority over `title`.
pub fn normalize(raw: &RawRecord) -> Result<Quote> {
    let text = raw
        .text
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| raw.title.as_deref().map(str::trim))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            QuoteError::MalformedRecord(match raw.id {
                Some(id) => format!("record {id} has no usable text"),
                None => "record has no usable text".to_string(),
            })
        })?;
    Ok(Quote {
        text: text.to_string(),
        category: REMOTE_CATEGORY.to_string(),
        author: REMOTE_AUTHOR.to_string(),
    })
}

/// Fixed collection used when nothing valid has been persisted yet.
pub fn seed_quotes() -> Vec<Quote> {
    [
        (
            "The best way to get started is to quit talking and begin doing.",
            "Motivation",
            "Unknown",
        ),
        (
            "Don’t let yesterday take up too much of today.",
            "Wisdom",
            "Will Rogers",
        ),
        (
            "It’s not whether you get knocked down, it’s whether you get up.",
            "Resilience",
            "Vince Lombardi",
        ),
    ]
    .into_iter()
    .map(|(text, category, author)| Quote {
        text: text.to_string(),
        category: category.to_string(),
        author: author.to_string(),
    })
    .collect()
}
