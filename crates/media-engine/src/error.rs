// FILE: crates/media-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Player unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("Player error: {0}")]
    Player(String),

    #[error("Player is not ready yet")]
    NotReady,

    #[error("Engine has been shut down")]
    ShutDown,

    #[error("No tokio runtime available to drive the engine")]
    NoRuntime,
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EngineError::AdapterUnavailable("no audio focus".to_string());
        assert!(error.to_string().contains("no audio focus"));
        assert_eq!(EngineError::NotReady.to_string(), "Player is not ready yet");
    }
}
