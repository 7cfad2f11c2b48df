//! Participant types: the registry's view of one remote person.

use tessera_protocol::ParticipantId;
use tessera_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Whether a participant currently has a live connection.
///
/// ```text
///   Attached ──(connection drops)──→ Detached
///       ↑                                │
///       └───────(resume with token)──────┘
/// ```
///
/// Detachment is not leaving: a detached participant keeps its name, its
/// resume token, and any room seat it holds. Records never expire, so a
/// participant can resume after an arbitrarily long absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// A live connection is bound to this participant.
    Attached(ConnectionId),

    /// No connection; the participant may resume with its token.
    Detached,
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A participant as the rest of the system sees one: a stable id plus the
/// display name everyone else knows them by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// The registry's full record for one participant.
///
/// The resume token is a secret shared only with that participant's
/// client; presenting it re-attaches the record to a new connection.
#[derive(Debug, Clone)]
pub struct ParticipantRecord {
    pub participant: Participant,
    pub attachment: Attachment,
    /// 32-character hex string, 128 bits of randomness.
    pub resume_token: String,
}

/// Outcome of a successful identification.
#[derive(Debug, Clone)]
pub struct IdentifiedParticipant {
    pub participant: Participant,
    /// The token the client must persist; on a resume this is the same
    /// token it presented.
    pub resume_token: String,
    /// `true` when an existing record was re-attached rather than a
    /// fresh one allocated.
    pub resumed: bool,
}
