use thiserror::Error;

/// Every failure the weather core can report.
///
/// The `Display` text is what ends up in front of the user, so keep it short
/// and free of internal detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// Empty city name or icon code; nothing was sent over the network.
    #[error("{0}")]
    InvalidQuery(String),

    /// Non-2xx response or a connection-level failure.
    #[error("{}", transport_message(.status, .message))]
    Transport { status: Option<u16>, message: String },

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Insecure or malformed icon URL, or bytes that are not an image.
    #[error("Invalid image asset: {0}")]
    InvalidAsset(String),

    #[error("Location permission denied")]
    NotAuthorized,

    #[error("Current location is unavailable")]
    LocationUnavailable,

    #[error("A location request is already in progress")]
    RequestInProgress,

    #[error("{0}")]
    Unknown(String),
}

impl WeatherError {
    pub fn empty_city() -> Self {
        Self::InvalidQuery("Please enter a city name.".to_string())
    }

    pub fn empty_icon_code() -> Self {
        Self::InvalidQuery("Please provide an icon code.".to_string())
    }

    pub fn status(code: u16) -> Self {
        Self::Transport { status: Some(code), message: String::new() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Transport { status: None, message: message.into() }
    }
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Server error ({code})"),
        None => format!("Network error: {message}"),
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::status(status.as_u16()),
            None if err.is_decode() => Self::Decode(err.to_string()),
            None => Self::connection(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_city_message_is_user_facing() {
        assert_eq!(WeatherError::empty_city().to_string(), "Please enter a city name.");
    }

    #[test]
    fn transport_message_depends_on_status() {
        assert_eq!(WeatherError::status(404).to_string(), "Server error (404)");

        let err = WeatherError::connection("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
