//! Error replies of the HTTP gateway.
//!
//! Every failure carries a code that names the exact place it came from,
//! so a reply alone tells which route and which step failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway error codes. The numeric values are part of the HTTP contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum AjaxCode {
    /// No error.
    Null = 0,
    /// Reply could not be encoded.
    BadBody = 1,
    /// Request body is missing.
    NoReq = 2,
    /// Request body is not valid JSON for the route.
    BadJson = 3,
    /// `/api/tool/ping` call failed.
    ToolPingCallFail = 4,
    /// `/api/port/set` without name or location code.
    PortSetNoData = 5,
    /// `/api/port/set` call failed.
    PortSetCallFail = 6,
    /// `/api/port/get` without key.
    PortGetNoData = 7,
    /// `/api/port/get` call failed.
    PortGetCallFail = 8,
    /// `/api/port/name` without name.
    PortNameNoData = 9,
    /// `/api/port/name` call failed.
    PortNameCallFail = 10,
    /// `/api/port/near` without a point.
    PortNearNoData = 11,
    /// `/api/port/near` call failed.
    PortNearCallFail = 12,
    /// `/api/port/circle` without center or radius.
    PortCircNoData = 13,
    /// `/api/port/circle` call failed.
    PortCircCallFail = 14,
    /// `/api/port/text` without search text.
    PortTextNoData = 15,
    /// `/api/port/text` call failed.
    PortTextCallFail = 16,
}

impl AjaxCode {
    /// Wire value.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Body of every error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AjaxErrorBody {
    /// Human readable cause.
    pub what: String,
    /// Unix time of the failure in milliseconds.
    pub when: i64,
    /// [`AjaxCode`] value.
    pub code: u16,
}

/// An error reply: HTTP status plus coded body.
#[derive(Debug)]
pub struct AjaxError {
    status: StatusCode,
    what: String,
    code: AjaxCode,
}

impl AjaxError {
    /// 400 reply.
    pub fn bad_request(what: impl Into<String>, code: AjaxCode) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            what: what.into(),
            code,
        }
    }

    /// 500 reply.
    pub fn internal(what: impl Into<String>, code: AjaxCode) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            what: what.into(),
            code,
        }
    }

    /// Argument check failed.
    pub fn no_data(code: AjaxCode) -> Self {
        Self::bad_request("data is empty", code)
    }

    /// Downstream call failed.
    pub fn call_failed(status: &tonic::Status, code: AjaxCode) -> Self {
        Self::internal(format!("{}: {}", status.code(), status.message()), code)
    }

    /// HTTP status of the reply.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Error code of the reply.
    pub fn code(&self) -> AjaxCode {
        self.code
    }
}

impl fmt::Display for AjaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error with code {}: {}", self.code.as_u16(), self.what)
    }
}

impl std::error::Error for AjaxError {}

impl IntoResponse for AjaxError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(code = self.code.as_u16(), "{}", self.what);
        } else {
            tracing::debug!(code = self.code.as_u16(), "{}", self.what);
        }

        let body = AjaxErrorBody {
            what: self.what,
            when: chrono::Utc::now().timestamp_millis(),
            code: self.code.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}
