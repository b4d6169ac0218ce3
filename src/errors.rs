use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::inference::AdapterFailure;

/// Placeholder echoed back instead of payloads that must never be reflected (raw image data).
pub const REDACTED_VALUE: &str = "<omitted>";

/// Non-validation error kinds the service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    Conflict,
    RateLimited,
    Internal,
}

impl DomainErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            DomainErrorKind::NotFound => StatusCode::NOT_FOUND,
            DomainErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            DomainErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainErrorKind::Forbidden => StatusCode::FORBIDDEN,
            DomainErrorKind::Conflict => StatusCode::CONFLICT,
            DomainErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DomainErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Field-level input violation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation error for field {field}: {message}")]
pub struct ValidationError {
    pub message: String,
    pub field: String,
    pub location: String,
    pub value: Option<Value>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
            location: "request.body".into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Replaces the echoed value with [`REDACTED_VALUE`].
    pub fn redacted(self) -> Self {
        self.with_value(REDACTED_VALUE)
    }

    /// Location as rendered on the wire, always pointing at the offending field when known.
    pub fn rendered_location(&self) -> Option<String> {
        match (self.location.is_empty(), self.field.is_empty()) {
            (false, false) => Some(format!("{}.{}", self.location, self.field)),
            (false, true) => Some(self.location.clone()),
            (true, false) => Some(format!("body.{}", self.field)),
            (true, true) => None,
        }
    }
}

/// Every failure a scan request can end in. Closed set; rendered by [`crate::response`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifiedError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error("{message}")]
    Domain {
        kind: DomainErrorKind,
        message: String,
    },
    /// The image decoded fine but shows no food. Keyed to the `image_base64` field.
    #[error("{message}")]
    NotFood { message: String },
}

impl ClassifiedError {
    pub fn domain(kind: DomainErrorKind, message: impl Into<String>) -> Self {
        ClassifiedError::Domain {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::domain(DomainErrorKind::BadRequest, message)
    }

    /// Internal failures carry no caller-visible detail; the mapper substitutes a generic message.
    pub fn internal() -> Self {
        Self::domain(DomainErrorKind::Internal, "")
    }

    pub fn not_food(detected_object: &str) -> Self {
        let detected = detected_object.trim();
        let message = if detected.is_empty() {
            "image does not contain food".to_string()
        } else {
            format!("image does not contain food (detected: {})", detected)
        };
        ClassifiedError::NotFood { message }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ClassifiedError::Validation(_) | ClassifiedError::NotFood { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ClassifiedError::Domain { kind, .. } => kind.status(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ClassifiedError::Domain {
                kind: DomainErrorKind::Internal,
                ..
            }
        )
    }
}

impl From<ValidationError> for ClassifiedError {
    fn from(err: ValidationError) -> Self {
        ClassifiedError::Validation(err)
    }
}

impl From<AdapterFailure> for ClassifiedError {
    fn from(_: AdapterFailure) -> Self {
        ClassifiedError::internal()
    }
}

impl From<anyhow::Error> for ClassifiedError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ClassifiedError>() {
            Ok(classified) => return classified,
            Err(err) => err,
        };
        let err = match err.downcast::<ValidationError>() {
            Ok(validation) => return validation.into(),
            Err(err) => err,
        };
        match err.downcast::<AdapterFailure>() {
            Ok(failure) => failure.into(),
            Err(_) => ClassifiedError::internal(),
        }
    }
}
