//! Participant identity for Tessera.
//!
//! This crate handles who a participant is, independent of any single
//! connection:
//!
//! 1. **Identification** — claiming a name (or getting a guest one) on a
//!    fresh connection ([`ParticipantRegistry::identify`])
//! 2. **Attachment tracking** — which connection, if any, currently
//!    speaks for a participant
//! 3. **Resumption** — token-based re-attachment after a disconnect,
//!    preserving the participant's name and any room seat
//!
//! The room layer above keys everything on [`ParticipantId`]s from this
//! crate's records; the transport below only knows connection ids.
//!
//! [`ParticipantId`]: tessera_protocol::ParticipantId

mod error;
mod participant;
mod registry;

pub use error::RegistryError;
pub use participant::{Attachment, IdentifiedParticipant, Participant, ParticipantRecord};
pub use registry::ParticipantRegistry;
