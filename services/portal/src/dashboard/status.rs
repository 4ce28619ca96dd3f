//! services/portal/src/dashboard/status.rs
//!
//! Transient banners. A message is shown until its deadline passes or it is
//! replaced; nothing has to clear it explicitly.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    expires_at: Instant,
}

impl StatusMessage {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A single-message slot with a fixed lifetime per message.
#[derive(Debug, Clone)]
pub struct Banner {
    ttl: Duration,
    current: Option<StatusMessage>,
}

impl Banner {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn show(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.current = Some(StatusMessage {
            text: text.into(),
            kind,
            expires_at: Instant::now() + self.ttl,
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The live message, if it has not expired yet.
    pub fn get(&self) -> Option<&StatusMessage> {
        self.current
            .as_ref()
            .filter(|message| !message.is_expired(Instant::now()))
    }
}
