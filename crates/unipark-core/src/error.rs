use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("map surface unavailable: {message}")]
    MapSurface { message: String },

    #[error("event channel disconnected: {channel}")]
    ChannelClosed { channel: &'static str },
}

impl Error {
    #[must_use]
    pub fn map_surface(message: impl Into<String>) -> Self {
        Self::MapSurface {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn channel_closed(channel: &'static str) -> Self {
        Self::ChannelClosed { channel }
    }

    /// Malformed out-of-band data is logged and dropped, never surfaced.
    #[must_use]
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::Payload(_))
    }
}
