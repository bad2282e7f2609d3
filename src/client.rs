//! Client side of the favorite heart: an optimistic boolean that flips on
//! click and snaps back if the server rejects the change.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::warn;

/// A boolean shown to the user before the server has confirmed it.
///
/// Observers subscribe to see every change, including the optimistic flip
/// and a possible revert.
#[derive(Debug)]
pub struct OptimisticToggle {
    state: watch::Sender<bool>,
}

impl OptimisticToggle {
    pub fn new(initial: bool) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    pub fn value(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Flip now, then send the new desired value. On error the previous
    /// value is restored and the error returned. No retries.
    pub async fn toggle<F, Fut, T, E>(&self, request: F) -> Result<T, E>
    where
        F: FnOnce(bool) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let previous = self.value();
        let desired = !previous;
        self.state.send_replace(desired);

        match request(desired).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.state.send_replace(previous);
                Err(e)
            }
        }
    }
}

/// Server answer for a favorite change
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FavoriteStatus {
    pub property_id: i64,
    pub favorited: bool,
    pub count: i64,
    pub message: String,
}

/// Talks to the favorites endpoints with a session token
#[derive(Debug, Clone)]
pub struct FavoritesClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl FavoritesClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// `PUT` to favorite, `DELETE` to unfavorite; both are idempotent server-side
    pub async fn set_favorite(&self, property_id: i64, favorited: bool) -> Result<FavoriteStatus> {
        let url = format!("{}/favorites/{}", self.base_url, property_id);
        let request = if favorited {
            self.http.put(&url)
        } else {
            self.http.delete(&url)
        };

        let response = request
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to send favorite request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Favorite request failed ({}): {}", status, body);
        }

        response
            .json::<FavoriteStatus>()
            .await
            .context("Failed to parse favorite response")
    }
}

/// One heart on one listing card
#[derive(Debug)]
pub struct FavoriteButton {
    property_id: i64,
    toggle: OptimisticToggle,
    client: Arc<FavoritesClient>,
}

impl FavoriteButton {
    pub fn new(client: Arc<FavoritesClient>, property_id: i64, favorited: bool) -> Self {
        Self {
            property_id,
            toggle: OptimisticToggle::new(favorited),
            client,
        }
    }

    pub fn is_favorited(&self) -> bool {
        self.toggle.value()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.toggle.subscribe()
    }

    /// Handle a click; the heart is already flipped while the request runs
    pub async fn click(&self) -> Result<FavoriteStatus> {
        let client = Arc::clone(&self.client);
        let property_id = self.property_id;

        let result = self
            .toggle
            .toggle(|desired| async move { client.set_favorite(property_id, desired).await })
            .await;

        if let Err(e) = &result {
            warn!(property_id, "Favorite change reverted: {:#}", e);
        }
        result
    }
}
