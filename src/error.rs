//! Crate error type
//!
//! Only construction paths fail: settings parsing/validation and spawning
//! the update loop thread. Runtime conditions (unsupported sensor, zero-size
//! surface, empty sound pool, cancellation) are absorbed where they occur.

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A settings value is out of its allowed range.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// Settings JSON could not be parsed or written.
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),

    /// Thread spawn or settings file failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidSetting("ball.radius must be > 0".to_string());
        let msg = e.to_string();
        assert!(msg.contains("invalid setting"));
        assert!(msg.contains("ball.radius"));
    }

    #[test]
    fn test_json_error_converts() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: Error = err.into();
        assert!(matches!(e, Error::Json(_)));
    }
}
