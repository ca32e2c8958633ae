// src/error.rs
use rocket::http::Status;
use std::fmt;

/// Failure kinds of the request-level operations (encode, predict, analyze).
#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    InvalidInput(String),
    UpstreamUnavailable(String),
    ModelUnavailable(String),
}

impl MatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(msg) | Self::UpstreamUnavailable(msg) | Self::ModelUnavailable(msg) => {
                msg
            }
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::InvalidInput(_) => Status::BadRequest,
            Self::UpstreamUnavailable(_) => Status::BadGateway,
            Self::ModelUnavailable(_) => Status::InternalServerError,
        }
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for MatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let err = MatchError::InvalidInput("Invalid GitHub URL".to_string());
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.status(), Status::BadRequest);
        assert_eq!(err.to_string(), "Invalid GitHub URL");

        let err = MatchError::ModelUnavailable("Model not loaded".to_string());
        assert_eq!(err.status(), Status::InternalServerError);
        assert_eq!(
            MatchError::UpstreamUnavailable("timeout".into()).status(),
            Status::BadGateway
        );
    }
}
