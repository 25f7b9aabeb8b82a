//! Data Transfer Objects

pub mod auth;
pub mod profile;
pub mod listing;
pub mod group;
pub mod conversation;

use serde::Serialize;

/// Plain confirmation body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
