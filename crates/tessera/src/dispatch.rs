//! Event delivery over per-connection channels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

use tessera_lobby::{Event, EventDispatcher};
use tessera_protocol::{ParticipantId, ServerEvent};

/// A participant's live outbound channel.
struct Outbound {
    epoch: u64,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Routes events to the connection currently attached to each recipient.
///
/// Each connection handler attaches a channel for its participant and
/// pumps the receiving end into its socket. Delivery is fire-and-forget:
/// a recipient with no attached channel is skipped, and the channel
/// closing under a handler is its signal that a newer connection took
/// over the identity.
pub struct ChannelDispatcher {
    channels: Mutex<HashMap<ParticipantId, Outbound>>,
    next_epoch: AtomicU64,
}

impl ChannelDispatcher {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            next_epoch: AtomicU64::new(1),
        }
    }

    /// Attaches a fresh outbound channel for `id`, displacing any prior
    /// one. Returns the attachment epoch (needed to detach exactly this
    /// attachment) and the receiving end.
    pub async fn attach(
        &self,
        id: ParticipantId,
    ) -> (u64, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let mut channels = self.channels.lock().await;
        if channels.insert(id, Outbound { epoch, tx }).is_some() {
            // The displaced sender drops here; the previous handler's
            // receiver closes and its pump exits.
            tracing::debug!(participant = %id, "outbound channel replaced");
        }
        (epoch, rx)
    }

    /// Detaches `id`'s channel, but only while it is still the `epoch`
    /// attachment. A stale handler cannot tear down its successor.
    pub async fn detach(&self, id: ParticipantId, epoch: u64) {
        let mut channels = self.channels.lock().await;
        if channels.get(&id).is_some_and(|o| o.epoch == epoch) {
            channels.remove(&id);
        }
    }

    /// Number of attached channels.
    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.lock().await.is_empty()
    }
}

impl Default for ChannelDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher for ChannelDispatcher {
    async fn deliver(&self, events: Vec<Event>) {
        let channels = self.channels.lock().await;
        for event in events {
            for id in &event.recipients {
                let Some(outbound) = channels.get(id) else {
                    // Detached participant; the event is dropped.
                    continue;
                };
                if outbound.tx.send(event.payload.clone()).is_err() {
                    tracing::debug!(
                        participant = %id,
                        kind = event.kind(),
                        "dropped event for closed channel"
                    );
                }
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
