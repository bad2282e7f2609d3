//! Outgoing user notifications (verification links, reset links, listing inquiries).
//!
//! Delivery is pluggable: the server logs each notification by default, and
//! tests capture them in memory.

use std::sync::Mutex;

use reqwest::Url;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    VerifyEmail {
        to: String,
        url: String,
    },
    ResetPassword {
        to: String,
        url: String,
    },
    PropertyInquiry {
        to: String,
        property_id: i64,
        property_title: String,
        from_name: String,
        from_email: String,
        phone: Option<String>,
        message: String,
    },
}

pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification);
}

/// Writes notifications to the structured log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: Notification) {
        match notification {
            Notification::VerifyEmail { to, url } => {
                info!(to = %to, url = %url, "Email verification link issued");
            }
            Notification::ResetPassword { to, url } => {
                info!(to = %to, url = %url, "Password reset link issued");
            }
            Notification::PropertyInquiry {
                to,
                property_id,
                from_email,
                ..
            } => {
                info!(to = %to, property_id, from = %from_email, "Listing inquiry received");
            }
        }
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent().pop()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
    }
}

/// `app_url` with `segments` appended to its path
fn app_link(app_url: &str, segments: &[&str]) -> Option<Url> {
    let mut url = Url::parse(app_url).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}

pub fn verification_url(app_url: &str, user_id: i64, token: &str) -> String {
    let id = user_id.to_string();
    match app_link(app_url, &["verify-email", &id, token]) {
        Some(url) => url.into(),
        None => {
            warn!(app_url, "APP_URL is not an absolute URL");
            format!("{}/verify-email/{}/{}", app_url, user_id, token)
        }
    }
}

pub fn reset_url(app_url: &str, email: &str, token: &str) -> String {
    match app_link(app_url, &["reset-password", token]) {
        Some(mut url) => {
            url.query_pairs_mut().append_pair("email", email);
            url.into()
        }
        None => {
            warn!(app_url, "APP_URL is not an absolute URL");
            format!("{}/reset-password/{}?email={}", app_url, token, email)
        }
    }
}
