//! Error types for the session layer.

/// Errors that can occur while identifying a participant.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The requested name is already held by another participant.
    ///
    /// Non-fatal to the connection: the caller answers `nameUnavailable`
    /// and the client may retry with a different name.
    #[error("name {0:?} is already taken")]
    NameTaken(String),
}
