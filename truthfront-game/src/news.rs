//! News items in play and a JSON-backed deck that hands them out.
use parking_lot::Mutex;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::ContentGenerator;
use crate::seed::stream_rng;

/// Ground-truth label attached to a news item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Veracity {
    True,
    False,
    Partial,
}

/// A news item contested during one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub title: String,
    pub body: String,
    pub veracity: Veracity,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: String,
}

impl News {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>, veracity: Veracity) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            veracity,
            category: None,
            source: String::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    fn matches_category(&self, category: Option<&str>) -> bool {
        match category {
            None => true,
            Some(wanted) => self
                .category
                .as_deref()
                .is_some_and(|have| have.eq_ignore_ascii_case(wanted)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NewsError {
    #[error("news deck is empty")]
    Empty,
    #[error("no news in category '{0}'")]
    NoCategory(String),
}

/// Container for all news items, serialized as `{ "news": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NewsData {
    pub news: Vec<News>,
}

impl NewsData {
    /// Load news data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into news data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Small built-in deck used when no asset is supplied.
    #[must_use]
    pub fn default_deck() -> Self {
        Self {
            news: vec![
                News::new(
                    "Tap water linked to memory loss",
                    "A viral post claims municipal water additives erode memory.",
                    Veracity::False,
                )
                .with_category("health")
                .with_source("forwarded message"),
                News::new(
                    "City expands night bus routes",
                    "The transit bureau adds four overnight lines from next month.",
                    Veracity::True,
                )
                .with_category("local")
                .with_source("transit bureau"),
                News::new(
                    "Vaccine batch recalled nationwide",
                    "One lot was paused for labelling errors; supply is unaffected.",
                    Veracity::Partial,
                )
                .with_category("health")
                .with_source("health ministry"),
                News::new(
                    "Power grid to fail this winter",
                    "An anonymous engineer predicts rolling blackouts all season.",
                    Veracity::False,
                )
                .with_category("energy")
                .with_source("anonymous blog"),
            ],
        }
    }
}

/// Deterministic content generator drawing from a fixed set of news items.
#[derive(Debug)]
pub struct NewsDeck {
    data: NewsData,
    rng: Mutex<ChaCha8Rng>,
}

impl NewsDeck {
    #[must_use]
    pub fn new(data: NewsData, seed: u64) -> Self {
        Self {
            data,
            rng: Mutex::new(stream_rng(seed, b"news")),
        }
    }

    /// Deck built from the built-in news items.
    #[must_use]
    pub fn with_default_deck(seed: u64) -> Self {
        Self::new(NewsData::default_deck(), seed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.news.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.news.is_empty()
    }

    /// Draw a news item, optionally restricted to a category.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError`] when no item matches.
    pub fn draw(&self, category: Option<&str>) -> Result<News, NewsError> {
        if self.data.news.is_empty() {
            return Err(NewsError::Empty);
        }
        let candidates: Vec<&News> = self
            .data
            .news
            .iter()
            .filter(|item| item.matches_category(category))
            .collect();
        if candidates.is_empty() {
            return Err(NewsError::NoCategory(category.unwrap_or_default().to_string()));
        }
        let index = self.rng.lock().gen_range(0..candidates.len());
        Ok(candidates[index].clone())
    }
}

impl ContentGenerator for NewsDeck {
    type Error = NewsError;

    fn next_news(&self, category: Option<&str>) -> Result<News, Self::Error> {
        self.draw(category)
    }
}
