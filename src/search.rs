//! Search-as-you-type over an in-memory list of listings.
//!
//! Keystrokes are debounced so filtering only runs once typing pauses.
//! Recent and trending suggestions live in local state only.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

/// Pause after the last keystroke before a search runs
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Emit the latest item once `input` has been quiet for `delay`.
///
/// Every new item restarts the wait. A pending item is flushed when the
/// input ends. The task stops when the receiver is dropped.
pub fn debounce<S>(input: S, delay: Duration) -> mpsc::Receiver<S::Item>
where
    S: Stream + Send + Unpin + 'static,
    S::Item: Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut input = input;
        let mut pending: Option<S::Item> = None;

        loop {
            // Outer None: the quiet period elapsed. Inner None: input ended.
            let next = if pending.is_some() {
                tokio::select! {
                    item = input.next() => Some(item),
                    _ = tokio::time::sleep(delay) => None,
                }
            } else {
                Some(input.next().await)
            };

            match next {
                Some(Some(item)) => pending = Some(item),
                Some(None) => {
                    if let Some(item) = pending.take() {
                        let _ = tx.send(item).await;
                    }
                    break;
                }
                None => {
                    if let Some(item) = pending.take() {
                        if tx.send(item).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    rx
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub title: String,
    pub location: String,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
        }
    }
}

/// Items to search plus the recent and trending lists
#[derive(Debug, Clone, Default)]
pub struct SuggestionBox {
    items: Vec<Suggestion>,
    recent: VecDeque<String>,
    trending: Vec<String>,
}

impl SuggestionBox {
    pub const RECENT_LIMIT: usize = 5;

    pub fn new(items: Vec<Suggestion>, trending: Vec<String>) -> Self {
        Self {
            items,
            recent: VecDeque::new(),
            trending,
        }
    }

    /// Case-insensitive substring match on title or location; a blank query matches nothing
    pub fn filter(&self, query: &str) -> Vec<&Suggestion> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.items
            .iter()
            .filter(|item| {
                item.title.to_lowercase().contains(&needle)
                    || item.location.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Remember a submitted search, newest first, without duplicates
    pub fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        let lowered = query.to_lowercase();
        self.recent.retain(|previous| previous.to_lowercase() != lowered);
        self.recent.push_front(query.to_string());
        self.recent.truncate(Self::RECENT_LIMIT);
    }

    pub fn recent(&self) -> Vec<&str> {
        self.recent.iter().map(String::as_str).collect()
    }

    pub fn trending(&self) -> &[String] {
        &self.trending
    }
}

/// Result of one debounced search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub matches: Vec<Suggestion>,
}

/// Filter `suggestions` each time typing in `keystrokes` pauses for `delay`
pub fn search_as_you_type<S>(
    suggestions: Arc<SuggestionBox>,
    keystrokes: S,
    delay: Duration,
) -> mpsc::Receiver<SearchResults>
where
    S: Stream<Item = String> + Send + Unpin + 'static,
{
    let mut queries = debounce(keystrokes, delay);
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        while let Some(query) = queries.recv().await {
            let matches = suggestions.filter(&query).into_iter().cloned().collect();
            if tx.send(SearchResults { query, matches }).await.is_err() {
                break;
            }
        }
    });

    rx
}
