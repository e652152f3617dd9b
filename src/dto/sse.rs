use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sync::WindowRole;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Construct an event from pre-rendered data.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`public`, `admin` or `viewer`).
    pub stream: String,
    /// Window whose state the stream follows.
    pub window_id: Uuid,
    pub role: WindowRole,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the state slot is currently failing.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Human-readable notice for the moderator or the audience.
pub struct Notice {
    pub message: String,
}
