//! Rendering of scan outcomes into HTTP status + JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::errors::ClassifiedError;
use crate::nutrition::dto::ScanResponse;

/// Only message a caller ever sees for an internal failure.
pub const DEFAULT_INTERNAL_ERROR_MESSAGE: &str = "something went wrong, please try again later";

pub const SUCCESS_STATUS: StatusCode = StatusCode::OK;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ErrorBody {
    fn generic(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            value: None,
        }
    }
}

pub fn render_error(err: &ClassifiedError) -> (StatusCode, ErrorBody) {
    let body = match err {
        ClassifiedError::Validation(v) => ErrorBody {
            message: v.message.clone(),
            location: v.rendered_location(),
            value: v.value.clone(),
        },
        ClassifiedError::NotFood { message } => ErrorBody {
            message: message.clone(),
            location: Some("request.body.image_base64".into()),
            value: Some(Value::from(crate::errors::REDACTED_VALUE)),
        },
        ClassifiedError::Domain { .. } if err.is_internal() => {
            ErrorBody::generic(DEFAULT_INTERNAL_ERROR_MESSAGE)
        }
        ClassifiedError::Domain { message, .. } => ErrorBody::generic(message.clone()),
    };
    (err.status(), body)
}

pub fn render_success(response: ScanResponse) -> (StatusCode, Json<ScanResponse>) {
    (SUCCESS_STATUS, Json(response))
}

impl IntoResponse for ClassifiedError {
    fn into_response(self) -> Response {
        let (status, body) = render_error(&self);
        if status.is_server_error() {
            error!(%status, "scan failed");
        } else {
            warn!(%status, message = %body.message, "scan rejected");
        }
        (status, Json(body)).into_response()
    }
}
