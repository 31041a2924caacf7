use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use trails_core::ChatChannel;

/// Artificial "thinking time" before each kind of reply is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDelays {
    pub assistant: Duration,
    pub widget: Duration,
    pub plan: Duration,
}

impl Default for ReplyDelays {
    fn default() -> Self {
        Self {
            assistant: Duration::from_millis(1_500),
            widget: Duration::from_millis(1_000),
            plan: Duration::from_millis(2_000),
        }
    }
}

impl ReplyDelays {
    pub fn none() -> Self {
        Self {
            assistant: Duration::ZERO,
            widget: Duration::ZERO,
            plan: Duration::ZERO,
        }
    }

    /// Reads `TRAILS_CHAT_DELAY_MS`, `TRAILS_WIDGET_DELAY_MS` and
    /// `TRAILS_PLAN_DELAY_MS`, keeping the default for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            assistant: env_millis("TRAILS_CHAT_DELAY_MS").unwrap_or(defaults.assistant),
            widget: env_millis("TRAILS_WIDGET_DELAY_MS").unwrap_or(defaults.widget),
            plan: env_millis("TRAILS_PLAN_DELAY_MS").unwrap_or(defaults.plan),
        }
    }

    pub fn for_channel(&self, channel: ChatChannel) -> Duration {
        match channel {
            ChatChannel::Assistant => self.assistant,
            ChatChannel::Widget => self.widget,
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// A reply that becomes available once its delay has elapsed.
///
/// Pending replies are independent: each one fires on its own timer, so
/// several scheduled back to back all deliver, earliest deadline first.
#[derive(Debug)]
pub struct PendingReply<T> {
    handle: JoinHandle<T>,
}

pub fn schedule_reply<T>(delay: Duration, value: T) -> PendingReply<T>
where
    T: Send + 'static,
{
    let handle = tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        value
    });
    PendingReply { handle }
}

impl<T> PendingReply<T> {
    /// Waits for delivery. Fails if the reply was cancelled.
    pub async fn wait(self) -> Result<T> {
        self.handle.await.context("pending reply did not complete")
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}
