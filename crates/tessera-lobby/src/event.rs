//! Events: what happened, and who needs to hear about it.
//!
//! Lobby operations never touch a socket. They return ordered lists of
//! [`Event`]s, and whoever called them hands the list to an
//! [`EventDispatcher`] for delivery. That split keeps the coordination
//! logic synchronous and testable while delivery stays fire-and-forget.

use tessera_protocol::{ParticipantId, ServerEvent};

/// One payload addressed to one or more participants.
#[derive(Debug, Clone)]
pub struct Event {
    /// Who should receive the payload. Duplicate-free; recipients
    /// without a live connection are skipped at delivery time.
    pub recipients: Vec<ParticipantId>,
    pub payload: ServerEvent,
}

impl Event {
    /// An event addressed to a single participant.
    pub fn to(id: ParticipantId, payload: ServerEvent) -> Self {
        Self {
            recipients: vec![id],
            payload,
        }
    }

    /// An event addressed to a set of participants.
    pub fn broadcast(ids: Vec<ParticipantId>, payload: ServerEvent) -> Self {
        Self {
            recipients: ids,
            payload,
        }
    }

    /// The wire name of the payload, for logging.
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Delivers events to the connections that can still hear them.
///
/// The lobby hands over an ordered list and does not await confirmation
/// or retry; a recipient with no live connection is silently skipped.
/// Order within one list must be preserved per recipient.
pub trait EventDispatcher: Send + Sync {
    async fn deliver(&self, events: Vec<Event>);
}
