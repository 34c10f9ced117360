//! HTTP API handlers for trifold-ui

pub mod ask;
pub mod buildinfo;
pub mod health;
pub mod history;
pub mod rating;
pub mod storage;
pub mod ui;

use serde::Serialize;

/// Generic acknowledgement body for mutating endpoints.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

impl AckResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
