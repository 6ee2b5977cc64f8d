//! Shared sign-in/sign-out marker.
//!
//! A single last-writer-wins slot shared by every manager in one client.
//! Each manager writes on its own transitions and reacts to writes made by
//! other tabs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use subtrack_shared::types::UserId;
use tokio::sync::watch;
use uuid::Uuid;

/// Identifies the manager that wrote a marker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    /// Creates a fresh tab ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

/// Transition recorded in the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// A user signed in.
    SignedIn {
        /// Who.
        user_id: UserId,
    },
    /// The session ended.
    SignedOut,
}

/// One write to the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEntry {
    /// Writer.
    pub tab: TabId,
    /// Transition.
    pub kind: MarkerKind,
    /// Write time.
    pub written_at: DateTime<Utc>,
}

/// Last-writer-wins slot. Clones share the slot.
#[derive(Debug, Clone)]
pub struct SessionMarker {
    slot: Arc<watch::Sender<Option<MarkerEntry>>>,
}

impl SessionMarker {
    /// Creates an empty marker.
    #[must_use]
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }

    /// Overwrites the slot.
    pub fn write(&self, tab: TabId, kind: MarkerKind) {
        self.slot.send_replace(Some(MarkerEntry {
            tab,
            kind,
            written_at: Utc::now(),
        }));
    }

    /// Returns the latest entry.
    #[must_use]
    pub fn current(&self) -> Option<MarkerEntry> {
        self.slot.borrow().clone()
    }

    /// Subscribes to future writes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<MarkerEntry>> {
        self.slot.subscribe()
    }
}

impl Default for SessionMarker {
    fn default() -> Self {
        Self::new()
    }
}
