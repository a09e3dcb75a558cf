//! Server configuration.

use std::time::Duration;

/// Tunables for a running server.
///
/// The defaults suit a small deployment: rooms whose group has emptied
/// are deleted on the spot, and rooms nobody has touched for an hour are
/// reclaimed by a background sweep.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long a room may sit with no activity before the sweep
    /// reclaims it. Creation, joins, and status changes count as
    /// activity.
    pub room_ttl: Duration,
    /// How often the background sweep runs.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            room_ttl: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
