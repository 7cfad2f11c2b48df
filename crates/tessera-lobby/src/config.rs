//! Lobby configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every room the lobby creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Maximum members per room. The ten-color palette caps the
    /// effective value at ten regardless of what is configured here.
    pub room_capacity: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self { room_capacity: 10 }
    }
}
