use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacerError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("worker execution failed: {0}")]
    Worker(String),
}

pub use crate::Result;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_error_display() {
        let err = PacerError::Config("interval must be non-zero".to_string());
        assert!(format!("{err}").contains("configuration error"));
        let err = PacerError::Worker("boom".to_string());
        assert!(format!("{err}").contains("worker execution failed"));
    }
}
