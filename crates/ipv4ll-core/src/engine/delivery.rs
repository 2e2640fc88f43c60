//! Event delivery to the host
//!
//! Either a single-slot mailbox drained with [`crate::Ipv4ll::pop_event`], or
//! a callback invoked synchronously from within dispatch.

use super::Ipv4llEvent;
use tracing::debug;

/// Host callback for push-style delivery
pub type EventCallback = Box<dyn FnMut(&Ipv4llEvent)>;

pub(crate) enum Delivery {
    /// Holds at most one undelivered event; newer events overwrite it
    Mailbox(Option<Ipv4llEvent>),
    Callback(EventCallback),
}

impl Delivery {
    pub(crate) fn mailbox() -> Self {
        Self::Mailbox(None)
    }

    pub(crate) fn deliver(&mut self, event: Ipv4llEvent) {
        match self {
            Self::Mailbox(slot) => {
                if let Some(previous) = slot.replace(event) {
                    debug!("Overwriting undelivered event {:?}", previous);
                }
            }
            Self::Callback(callback) => callback(&event),
        }
    }

    pub(crate) fn take(&mut self) -> Option<Ipv4llEvent> {
        match self {
            Self::Mailbox(slot) => slot.take(),
            Self::Callback(_) => None,
        }
    }
}
