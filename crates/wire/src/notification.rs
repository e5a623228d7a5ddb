// SPDX-License-Identifier: MIT

//! Server-initiated notification envelope (`spec.md` §4.1, §4.5): unsolicited
//! messages from the worker's notification channel, never sent in response
//! position.

use mirrord_core::JobId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "notification")]
    Notification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum NotificationEvent {
    #[serde(rename = "job_finished")]
    JobFinished { job_id: JobId, success: bool, returncode: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(flatten)]
    pub event: NotificationEvent,
}

impl Notification {
    pub fn job_finished(job_id: JobId, success: bool, returncode: i32) -> Self {
        Self {
            kind: NotificationKind::Notification,
            event: NotificationEvent::JobFinished { job_id, success, returncode },
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
