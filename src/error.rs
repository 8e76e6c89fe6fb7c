//! Lookup failures and their translation into JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

/// Details value used when the failure carries no upstream payload
pub const NO_ADDITIONAL_DETAILS: &str = "No additional details";

#[derive(Debug)]
pub enum LookupError {
    /// The request carried no CAPTCHA token
    MissingCaptcha,
    /// The verification service reported failure
    CaptchaRejected,
    /// No such user or page upstream
    NotFound(String),
    /// Any other upstream failure
    Upstream {
        message: String,
        status: Option<u16>,
        details: Option<Value>,
    },
}

impl LookupError {
    /// Upstream answered with a non-success status
    pub fn upstream_status(status: u16, details: Option<Value>) -> Self {
        LookupError::Upstream {
            message: format!("Request failed with status code {status}"),
            status: Some(status),
            details,
        }
    }

    /// Upstream could not be reached, timed out, or sent an unusable body
    pub fn upstream_transport(err: impl fmt::Display) -> Self {
        LookupError::Upstream {
            message: err.to_string(),
            status: None,
            details: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::MissingCaptcha | LookupError::CaptchaRejected => StatusCode::BAD_REQUEST,
            LookupError::NotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LookupError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Upstream payload for the `details` field. CAPTCHA failures carry none.
    fn details(&self) -> Option<Value> {
        match self {
            LookupError::MissingCaptcha | LookupError::CaptchaRejected => None,
            LookupError::NotFound(_) => Some(Value::from(NO_ADDITIONAL_DETAILS)),
            LookupError::Upstream { details, .. } => Some(
                details
                    .clone()
                    .unwrap_or_else(|| Value::from(NO_ADDITIONAL_DETAILS)),
            ),
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::MissingCaptcha => write!(f, "reCAPTCHA required"),
            LookupError::CaptchaRejected => write!(f, "reCAPTCHA verification failed"),
            LookupError::NotFound(msg) => write!(f, "{msg}"),
            LookupError::Upstream { message, .. } => write!(f, "{message}"),
        }
    }
}

impl Error for LookupError {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = self.details();

        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}
