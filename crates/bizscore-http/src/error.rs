use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Request Timeout")]
    RequestTimeout,

    #[error("Payload Too Large")]
    PayloadTooLarge,

    #[error("Request Header Fields Too Large")]
    HeadersTooLarge,

    #[error("{0}")]
    Internal(String),

    #[error("Service Unavailable")]
    Unavailable,
}

impl ScoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub const fn status(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::InvalidInput(_) => 400,
            Self::RequestTimeout => 408,
            Self::PayloadTooLarge => 413,
            Self::HeadersTooLarge => 431,
            Self::Internal(_) => 500,
            Self::Unavailable => 503,
        }
    }

    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_) | Self::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_stable() {
        assert_eq!(ScoreError::MethodNotAllowed.status(), 405);
        assert_eq!(ScoreError::invalid("x").status(), 400);
        assert_eq!(ScoreError::RequestTimeout.status(), 408);
        assert_eq!(ScoreError::PayloadTooLarge.status(), 413);
        assert_eq!(ScoreError::HeadersTooLarge.status(), 431);
        assert_eq!(ScoreError::internal("x").status(), 500);
        assert_eq!(ScoreError::Unavailable.status(), 503);
        assert!(!ScoreError::internal("x").is_client_error());
        assert!(!ScoreError::Unavailable.is_client_error());
        assert!(ScoreError::RequestTimeout.is_client_error());
        assert_eq!(ScoreError::MethodNotAllowed.to_string(), "Method Not Allowed");
        assert_eq!(ScoreError::PayloadTooLarge.to_string(), "Payload Too Large");
    }
}
