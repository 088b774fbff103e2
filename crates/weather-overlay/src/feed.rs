// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background frame-list polling.
//!
//! Polls the proxy's `/frames` endpoint on an interval and reports new frame
//! lists as events. A separate display tick fires every 30 seconds so the
//! "minutes ago" label can be refreshed; it never touches the network.
//!
//! Fetches are not cancelled mid-flight. A result that completes after
//! shutdown is discarded before it is delivered.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::frame::FrameId;
use crate::sync::SyncEvent;

/// Errors from a single frame-list poll.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("frame list request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("frame list returned HTTP {0}")]
    Status(u16),

    #[error("malformed frame list: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Configuration for the frame feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Full URL of the proxy's frame-list endpoint.
    pub frames_url: String,
    /// How often to re-fetch the frame list.
    pub refresh_interval: Duration,
    /// How often to emit display ticks.
    pub tick_interval: Duration,
    /// Channel buffer size for events.
    pub buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            frames_url: "http://127.0.0.1:3000/frames".to_string(),
            refresh_interval: Duration::from_secs(300),
            tick_interval: Duration::from_secs(30),
            buffer_size: 16,
        }
    }
}

/// Events emitted by the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A fresh frame list, oldest first.
    Frames(Vec<FrameId>),
    /// A poll failed; the previous list stays in effect.
    Failed(String),
    /// Time to re-render relative time labels.
    Tick,
}

impl FeedEvent {
    /// The engine event this feed event maps to, if any.
    #[must_use]
    pub fn into_sync_event(self) -> Option<SyncEvent> {
        match self {
            FeedEvent::Frames(frames) => Some(SyncEvent::FrameListRefreshed(frames)),
            FeedEvent::Failed(_) | FeedEvent::Tick => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FramesDocument {
    times: Vec<u64>,
}

/// Parse the proxy's `{ "times": [...] }` body.
pub fn parse_frames(body: &[u8]) -> Result<Vec<FrameId>, FeedError> {
    let doc: FramesDocument = serde_json::from_slice(body)?;
    Ok(doc.times.into_iter().map(FrameId::new).collect())
}

/// Handle to a running frame feed.
pub struct FrameFeed {
    event_rx: mpsc::Receiver<FeedEvent>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for FrameFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameFeed")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl FrameFeed {
    /// Spawn the polling task. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn spawn(config: FeedConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size);
        let cancel_token = CancellationToken::new();
        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            feed_loop(config, event_tx, task_cancel).await;
        });

        Self {
            event_rx,
            cancel_token,
        }
    }

    /// Next event, or `None` once the feed has shut down.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.event_rx.recv().await
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for FrameFeed {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn feed_loop(
    config: FeedConfig,
    event_tx: mpsc::Sender<FeedEvent>,
    cancel_token: CancellationToken,
) {
    let client = reqwest::Client::new();

    let mut refresh = tokio::time::interval(config.refresh_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticker = tokio::time::interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Polling frame list from {}", config.frames_url);

    loop {
        let event = tokio::select! {
            biased;

            () = cancel_token.cancelled() => {
                info!("Frame feed cancelled");
                return;
            }
            _ = refresh.tick() => {
                match fetch_frames(&client, &config.frames_url).await {
                    Ok(frames) => {
                        debug!("Frame list refreshed: {} frame(s)", frames.len());
                        FeedEvent::Frames(frames)
                    }
                    Err(e) => {
                        warn!("Frame list refresh failed: {e}");
                        FeedEvent::Failed(e.to_string())
                    }
                }
            }
            _ = ticker.tick() => FeedEvent::Tick,
        };

        // The fetch may have finished after teardown
        if cancel_token.is_cancelled() {
            debug!("Discarding {event:?} after shutdown");
            return;
        }

        if event_tx.send(event).await.is_err() {
            return; // Receiver dropped
        }
    }
}

async fn fetch_frames(client: &reqwest::Client, url: &str) -> Result<Vec<FrameId>, FeedError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(FeedError::Status(response.status().as_u16()));
    }
    let body = response.bytes().await?;
    parse_frames(&body)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;

    #[test]
    fn test_parse_frames() {
        let frames = parse_frames(br#"{"times":[100,200,300]}"#).unwrap();
        assert_eq!(frames, vec![FrameId::new(100), FrameId::new(200), FrameId::new(300)]);
    }

    #[test]
    fn test_parse_frames_rejects_garbage() {
        assert!(matches!(parse_frames(b"{}"), Err(FeedError::Malformed(_))));
        assert!(matches!(parse_frames(br#"{"times":"x"}"#), Err(FeedError::Malformed(_))));
    }

    #[test]
    fn test_only_frames_reach_the_engine() {
        assert_eq!(
            FeedEvent::Frames(vec![FrameId::new(1)]).into_sync_event(),
            Some(SyncEvent::FrameListRefreshed(vec![FrameId::new(1)]))
        );
        assert_eq!(FeedEvent::Tick.into_sync_event(), None);
        assert_eq!(FeedEvent::Failed("boom".to_string()).into_sync_event(), None);
    }

    async fn serve_frames(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/frames")
    }

    fn config(frames_url: String) -> FeedConfig {
        FeedConfig {
            frames_url,
            refresh_interval: Duration::from_secs(3600),
            tick_interval: Duration::from_secs(3600),
            buffer_size: 4,
        }
    }

    #[tokio::test]
    async fn test_poll_emits_frames() {
        let router = axum::Router::new().route(
            "/frames",
            axum::routing::get(|| async { r#"{"times":[100,200]}"# }),
        );
        let mut feed = FrameFeed::spawn(config(serve_frames(router).await));

        assert_eq!(
            feed.recv().await,
            Some(FeedEvent::Frames(vec![FrameId::new(100), FrameId::new(200)]))
        );
        assert_eq!(feed.recv().await, Some(FeedEvent::Tick));
    }

    #[tokio::test]
    async fn test_result_after_shutdown_is_discarded() {
        let started = Arc::new(Notify::new());
        let handler_started = Arc::clone(&started);
        let router = axum::Router::new().route(
            "/frames",
            axum::routing::get(move || {
                let started = Arc::clone(&handler_started);
                async move {
                    started.notify_one();
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    r#"{"times":[100,200,300]}"#
                }
            }),
        );
        let mut feed = FrameFeed::spawn(config(serve_frames(router).await));

        // Shut down while the fetch is in flight
        started.notified().await;
        feed.shutdown();

        assert_eq!(feed.recv().await, None);
    }

    #[tokio::test]
    async fn test_shutdown_closes_feed() {
        let mut feed = FrameFeed::spawn(FeedConfig {
            frames_url: "http://127.0.0.1:9/frames".to_string(),
            refresh_interval: Duration::from_secs(3600),
            tick_interval: Duration::from_secs(30),
            buffer_size: 4,
        });
        feed.shutdown();
        assert_eq!(feed.recv().await, None);
    }
}
