//! Live-update events for open article sessions
//!
//! Each article that has at least one open editor session owns a broadcast
//! channel inside the [`ArticleHub`]. Publishing to an article nobody watches
//! is a no-op; the channel disappears when its last subscription drops.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::models::{Article, Comment};

/// Default per-article channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Event pushed to every session watching an article
///
/// Serialized with a `type` tag, e.g. `{"type":"article-updated",...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ArticleEvent {
    /// First event on every stream
    Connected { client_id: String },

    /// Article fields changed
    ArticleUpdated { article: Article, updated_by: String },

    /// Article moved to PUBLISHED
    ArticlePublished { article: Article },

    /// New comment or reply on the article
    CommentAdded { comment: Comment },
}

impl ArticleEvent {
    /// Wire name of the event
    pub fn event_type(&self) -> &'static str {
        match self {
            ArticleEvent::Connected { .. } => "connected",
            ArticleEvent::ArticleUpdated { .. } => "article-updated",
            ArticleEvent::ArticlePublished { .. } => "article-published",
            ArticleEvent::CommentAdded { .. } => "comment-added",
        }
    }
}

struct HubInner {
    channels: Mutex<HashMap<String, broadcast::Sender<ArticleEvent>>>,
    capacity: usize,
    next_client: AtomicU64,
    closed: AtomicBool,
}

impl HubInner {
    fn channels(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<ArticleEvent>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory fan-out of article events, keyed by article id
#[derive(Clone)]
pub struct ArticleHub {
    inner: Arc<HubInner>,
}

impl Default for ArticleHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ArticleHub {
    /// Creates a hub whose per-article channels buffer `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: Mutex::new(HashMap::new()),
                capacity: capacity.max(1),
                next_client: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Open a session on `article_id` for `user_id`
    pub fn subscribe(&self, article_id: &str, user_id: &str) -> ArticleSubscription {
        let seq = self.inner.next_client.fetch_add(1, Ordering::Relaxed);
        let client_id = format!(
            "{}-{}-{}",
            user_id,
            chrono::Utc::now().timestamp_millis(),
            seq
        );

        let receiver = if self.inner.closed.load(Ordering::Acquire) {
            // Sender dropped at once, so the session ends immediately
            broadcast::channel(1).1
        } else {
            let mut channels = self.inner.channels();
            channels
                .entry(article_id.to_string())
                .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
                .subscribe()
        };

        debug!(article_id = %article_id, client_id = %client_id, "Article session opened");

        ArticleSubscription {
            article_id: article_id.to_string(),
            client_id,
            receiver,
            hub: Arc::clone(&self.inner),
        }
    }

    /// Send `event` to every session watching `article_id`
    ///
    /// Returns the number of sessions that received it.
    pub fn broadcast(&self, article_id: &str, event: ArticleEvent) -> usize {
        let sender = self.inner.channels().get(article_id).cloned();

        match sender {
            Some(sender) => {
                let event_type = event.event_type();
                let delivered = sender.send(event).unwrap_or(0);
                debug!(article_id = %article_id, event_type, delivered, "Broadcast article event");
                delivered
            }
            None => 0,
        }
    }

    /// Number of open sessions on `article_id`
    pub fn watcher_count(&self, article_id: &str) -> usize {
        self.inner
            .channels()
            .get(article_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Number of articles with at least one open session
    pub fn active_articles(&self) -> usize {
        self.inner.channels().len()
    }

    /// End every open session and refuse new ones
    ///
    /// Dropping the senders closes each channel, so open event streams
    /// finish and graceful shutdown can drain their connections.
    pub fn close_all(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let closed = {
            let mut channels = self.inner.channels();
            let count = channels.len();
            channels.clear();
            count
        };
        info!(articles = closed, "Closed all article sessions");
    }
}

/// One open session on an article
///
/// Dropping it unregisters the session.
pub struct ArticleSubscription {
    article_id: String,
    client_id: String,
    receiver: broadcast::Receiver<ArticleEvent>,
    hub: Arc<HubInner>,
}

impl ArticleSubscription {
    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Wait for the next event
    ///
    /// Events missed because this session fell behind are skipped.
    /// Returns `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<ArticleEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        article_id = %self.article_id,
                        client_id = %self.client_id,
                        skipped,
                        "Article session lagged, skipping events"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for ArticleSubscription {
    fn drop(&mut self) {
        let mut channels = self.hub.channels();
        // Our own receiver is still alive here, so 1 means "last one"
        let last = channels
            .get(&self.article_id)
            .map(|sender| sender.receiver_count() <= 1)
            .unwrap_or(false);
        if last {
            channels.remove(&self.article_id);
        }
        debug!(article_id = %self.article_id, client_id = %self.client_id, "Article session closed");
    }
}
