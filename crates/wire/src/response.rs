// SPDX-License-Identifier: MIT

//! Response envelope (`spec.md` §4.1): `{status, message, data}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub status: u16,
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Response {
    pub const OK: u16 = 200;
    pub const PROTOCOL_MISMATCH: u16 = 400;
    pub const APP_MISMATCH: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const HANDLER_ERROR: u16 = 500;

    pub fn ok(data: Value) -> Self {
        Self { status: Self::OK, message: "OK".to_string(), data }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: Self::NOT_FOUND, message: message.into(), data: Value::Null }
    }

    /// A handler-side exception (`spec.md` §7 `HandlerException`). `traceback`
    /// is carried in `data.traceback` as a diagnostic, never the primary signal.
    pub fn handler_error(message: impl Into<String>, traceback: Option<String>) -> Self {
        let data = match traceback {
            Some(tb) => serde_json::json!({ "traceback": tb }),
            None => Value::Null,
        };
        Self { status: Self::HANDLER_ERROR, message: message.into(), data }
    }

    pub fn app_mismatch(message: impl Into<String>) -> Self {
        Self { status: Self::APP_MISMATCH, message: message.into(), data: Value::Null }
    }

    pub fn protocol_mismatch(message: impl Into<String>) -> Self {
        Self { status: Self::PROTOCOL_MISMATCH, message: message.into(), data: Value::Null }
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::OK
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
