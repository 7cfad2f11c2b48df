//! The participant registry: every identity the coordinator knows about.
//!
//! The registry owns the mapping between live connections and stable
//! participant identities. A participant outlives its connections: when a
//! socket drops, the record is only detached, and presenting the resume
//! token on a later connection re-attaches it with the same id and name.
//!
//! # Concurrency note
//!
//! `ParticipantRegistry` is NOT thread-safe by itself; it uses plain
//! `HashMap`s. The server owns one instance behind a `tokio::sync::Mutex`
//! and serializes access at that level.

use std::collections::HashMap;

use rand::Rng;
use tessera_protocol::ParticipantId;
use tessera_transport::ConnectionId;

use crate::{
    Attachment, IdentifiedParticipant, Participant, ParticipantRecord, RegistryError,
};

/// Tracks every participant the coordinator has ever identified.
///
/// Four maps, kept in sync: the records themselves keyed by id, plus
/// indexes by resume token, by name, and by live connection. Names are
/// unique among records; records never expire, so a claimed name stays
/// reserved for the process lifetime.
pub struct ParticipantRegistry {
    records: HashMap<ParticipantId, ParticipantRecord>,
    tokens: HashMap<String, ParticipantId>,
    names: HashMap<String, ParticipantId>,
    connections: HashMap<ConnectionId, ParticipantId>,
    next_id: u64,
    next_guest: u64,
}

impl ParticipantRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            tokens: HashMap::new(),
            names: HashMap::new(),
            connections: HashMap::new(),
            next_id: 1,
            next_guest: 1,
        }
    }

    /// Establishes an identity for a connection.
    ///
    /// A valid `resume_token` re-attaches the existing record to `conn`
    /// and returns it with `resumed = true`; the token wins even when a
    /// different `name` is requested alongside it. An unknown or absent
    /// token allocates a fresh participant under the requested name, or
    /// under a generated `guest-<n>` name when none is given. A fresh
    /// participant gets a newly generated resume token which the caller
    /// must deliver to the client.
    ///
    /// If `conn` had already identified as someone else, that record is
    /// detached first.
    ///
    /// # Errors
    /// Returns [`RegistryError::NameTaken`] when the requested name is
    /// held by another record. The original holder is untouched.
    pub fn identify(
        &mut self,
        conn: ConnectionId,
        name: Option<&str>,
        resume_token: Option<&str>,
    ) -> Result<IdentifiedParticipant, RegistryError> {
        // A connection that identifies again abandons its previous identity.
        self.forget(conn);

        if let Some(presented) = resume_token {
            if let Some(id) = self.tokens.get(presented).copied() {
                if let Some(record) = self.records.get_mut(&id) {
                    // Token takeover: a resume from a new connection wins
                    // over any stale one still attached.
                    if let Attachment::Attached(old) = record.attachment {
                        self.connections.remove(&old);
                    }
                    record.attachment = Attachment::Attached(conn);
                    self.connections.insert(conn, id);

                    let participant = record.participant.clone();
                    let resume_token = record.resume_token.clone();
                    tracing::info!(%id, name = %participant.name, %conn, "participant resumed");
                    return Ok(IdentifiedParticipant {
                        participant,
                        resume_token,
                        resumed: true,
                    });
                }
            }
            tracing::debug!(%conn, "unknown resume token, allocating a fresh participant");
        }

        let name = match name {
            Some(requested) => {
                if self.names.contains_key(requested) {
                    return Err(RegistryError::NameTaken(requested.to_string()));
                }
                requested.to_string()
            }
            None => self.next_guest_name(),
        };

        let id = ParticipantId(self.next_id);
        self.next_id += 1;
        let token = generate_token();

        let participant = Participant { id, name: name.clone() };
        self.records.insert(
            id,
            ParticipantRecord {
                participant: participant.clone(),
                attachment: Attachment::Attached(conn),
                resume_token: token.clone(),
            },
        );
        self.names.insert(name, id);
        self.tokens.insert(token.clone(), id);
        self.connections.insert(conn, id);

        tracing::info!(%id, name = %participant.name, %conn, "participant registered");

        Ok(IdentifiedParticipant {
            participant,
            resume_token: token,
            resumed: false,
        })
    }

    /// Detaches whatever participant is bound to `conn`.
    ///
    /// The record itself survives, name, token, and any room seat
    /// included; only the connection binding is dropped. Returns the
    /// detached participant's id so the caller can unregister its event
    /// sender. Returns `None` if the connection never identified.
    pub fn forget(&mut self, conn: ConnectionId) -> Option<ParticipantId> {
        let id = self.connections.remove(&conn)?;
        if let Some(record) = self.records.get_mut(&id) {
            record.attachment = Attachment::Detached;
            tracing::debug!(%id, name = %record.participant.name, %conn, "participant detached");
        }
        Some(id)
    }

    /// Looks up a participant by id.
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.records.get(&id).map(|r| &r.participant)
    }

    /// Looks up the participant currently attached to a connection.
    pub fn by_connection(&self, conn: ConnectionId) -> Option<&Participant> {
        let id = self.connections.get(&conn)?;
        self.records.get(id).map(|r| &r.participant)
    }

    /// The full record for a participant, attachment state included.
    pub fn record(&self, id: ParticipantId) -> Option<&ParticipantRecord> {
        self.records.get(&id)
    }

    /// Number of known participants, attached or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no participant has ever identified.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn next_guest_name(&mut self) -> String {
        // The counter only moves forward, but a user may have claimed
        // "guest-<n>" as an ordinary name, so step past any taken ones.
        loop {
            let candidate = format!("guest-{}", self.next_guest);
            self.next_guest += 1;
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// Used for resume tokens: a secret only the server and one client know,
/// long enough that guessing a live token is infeasible.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
