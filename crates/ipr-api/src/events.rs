//! # Change Bus
//!
//! Push notification of entry and vocabulary changes to live readers.
//!
//! Backed by `tokio::sync::broadcast`: every subscriber sees every event
//! published after it subscribed. Publishing never fails the caller. With
//! no subscribers the event is dropped, and a subscriber that falls more
//! than the channel capacity behind skips the events it missed.

use ipr_core::{Category, DropdownOption, Entry};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

/// Default number of buffered events per subscriber.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Which family of records a change concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Entry records.
    Entries,
    /// Dropdown options.
    Options,
}

/// A change to a registry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeEvent {
    /// A new entry was persisted.
    EntryCreated { entry: Entry },
    /// An admin edited an entry.
    EntryUpdated { entry: Entry },
    /// An entry was soft-deleted.
    EntryDeleted { id: Uuid, reference_code: String },
    /// A custom option was registered.
    OptionAdded { option: DropdownOption },
    /// An option was edited, activated, or deactivated.
    OptionUpdated { option: DropdownOption },
    /// A custom option was hard-deleted.
    OptionRemoved {
        id: Uuid,
        category: Category,
        value: String,
    },
}

impl ChangeEvent {
    /// The topic this event belongs to.
    pub fn topic(&self) -> Topic {
        match self {
            Self::EntryCreated { .. } | Self::EntryUpdated { .. } | Self::EntryDeleted { .. } => {
                Topic::Entries
            }
            Self::OptionAdded { .. } | Self::OptionUpdated { .. } | Self::OptionRemoved { .. } => {
                Topic::Options
            }
        }
    }

    /// SSE event name, e.g. `entry_created`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EntryCreated { .. } => "entry_created",
            Self::EntryUpdated { .. } => "entry_updated",
            Self::EntryDeleted { .. } => "entry_deleted",
            Self::OptionAdded { .. } => "option_added",
            Self::OptionUpdated { .. } => "option_updated",
            Self::OptionRemoved { .. } => "option_removed",
        }
    }
}

/// Cloneable handle to the broadcast channel.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    /// A bus with [`DEFAULT_CHANNEL_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// A bus buffering up to `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns the number of subscribers reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(n) => n,
            Err(_) => {
                tracing::debug!(event = name, "no change subscribers; event dropped");
                0
            }
        }
    }

    /// Subscribe to every future event.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removed() -> ChangeEvent {
        ChangeEvent::OptionRemoved {
            id: Uuid::nil(),
            category: Category::SiteName,
            value: "NEW".into(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = ChangeBus::new();
        assert_eq!(bus.publish(removed()), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_event() {
        let bus = ChangeBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(bus.publish(removed()), 2);
        assert_eq!(a.recv().await.unwrap(), removed());
        assert_eq!(b.recv().await.unwrap(), removed());
    }

    #[test]
    fn topic_and_name() {
        let e = ChangeEvent::EntryDeleted {
            id: Uuid::nil(),
            reference_code: "IPR/TC/HFEX/1MW/KA/SJPR/26001/01".into(),
        };
        assert_eq!(e.topic(), Topic::Entries);
        assert_eq!(e.name(), "entry_deleted");
        assert_eq!(removed().topic(), Topic::Options);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let v = serde_json::to_value(removed()).unwrap();
        assert_eq!(v["type"], "OPTION_REMOVED");
        assert_eq!(v["category"], "SITE_NAME");
    }
}
