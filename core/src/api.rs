use thiserror::Error;

use crate::codec::decode;
use crate::cooldown::parse_cooldown;
use crate::protocol::{ErrorBody, GridResponse, PlacePixelRequest};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Builds a rejection from a non-success response, preferring the
    /// authority's `{error}` message.
    pub fn rejected(status: u16, body: &str) -> Self {
        let message = decode::<ErrorBody>(body)
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("HTTP error {status}"));
        ApiError::Rejected { status, message }
    }

    /// Remaining cooldown in seconds, when the rejection was a rate limit.
    pub fn cooldown(&self) -> Option<f64> {
        match self {
            ApiError::Rejected { message, .. } => parse_cooldown(message),
            _ => None,
        }
    }
}

/// Request/response side of the authority: bulk read and confirmable writes.
#[allow(async_fn_in_trait)]
pub trait PixelApi {
    async fn fetch_grid(&self) -> Result<GridResponse, ApiError>;
    async fn place_pixel(&self, request: &PlacePixelRequest) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_uses_error_body() {
        let err = ApiError::rejected(429, r#"{"error":"Too soon. Wait 2.50 seconds"}"#);
        assert_eq!(err.to_string(), "Too soon. Wait 2.50 seconds");
        assert_eq!(err.cooldown(), Some(2.5));
    }

    #[test]
    fn rejection_without_body_reports_status() {
        let err = ApiError::rejected(500, "<html>");
        assert_eq!(err.to_string(), "HTTP error 500");
        assert_eq!(err.cooldown(), None);
    }

    #[test]
    fn transport_errors_are_never_cooldowns() {
        assert_eq!(ApiError::Transport("Wait 3 seconds".into()).cooldown(), None);
    }
}
