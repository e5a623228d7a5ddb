// SPDX-License-Identifier: MIT

//! Request envelope (`spec.md` §4.1): `{command, kwargs}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub kwargs: Option<Value>,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), kwargs: None }
    }

    pub fn with_kwargs(command: impl Into<String>, kwargs: Value) -> Self {
        Self { command: command.into(), kwargs: Some(kwargs) }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
