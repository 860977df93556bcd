//! Request and response bodies for the HTTP API.

pub mod assignment;
pub mod session;
pub mod student;

pub use assignment::*;
pub use session::*;
pub use student::*;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::error::AppError;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Decode a JSON body that may be omitted. An empty body yields the default;
/// anything else must be valid JSON for `T`.
pub fn parse_optional_body<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        let mut error = ValidationError::new("invalid_json");
        error.message = Some(Cow::Owned(e.to_string()));
        let mut errors = ValidationErrors::new();
        errors.add("body", error);
        AppError::ValidationError(errors)
    })
}

/// Common list query parameters.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListQuery {
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, message = "offset must not be negative"))]
    pub offset: Option<i64>,
    #[validate(length(max = 100))]
    pub subject: Option<String>,
    /// `assignment` or `quiz`.
    pub kind: Option<String>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_and_clamps() {
        let query = ListQuery::default();
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset(), 0);
        assert!(query.subject().is_none());

        let query = ListQuery {
            limit: Some(500),
            subject: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert!(query.validate().is_err());
        assert!(query.subject().is_none());
    }

    #[test]
    fn optional_body_accepts_empty_and_rejects_malformed_json() {
        let empty: RequestFeedbackRequest = parse_optional_body(b"").unwrap();
        assert!(empty.subject.is_none());
        let blank: RequestFeedbackRequest = parse_optional_body(b"  \n").unwrap();
        assert!(blank.subject.is_none());

        let given: RequestFeedbackRequest = parse_optional_body(br#"{"subject": "Math"}"#).unwrap();
        assert_eq!(given.subject.as_deref(), Some("Math"));

        for bad in [&br#"{"subject": 7}"#[..], &br#"{"subject": "#[..]] {
            let err = parse_optional_body::<RequestFeedbackRequest>(bad).unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }
}
