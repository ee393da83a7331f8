//! Messaging gateway abstraction.
//!
//! The monitor never talks to the chat network directly. It sends through a
//! [`MessagingGateway`], which makes the alert and broadcast paths testable
//! and keeps the Telegram specifics in [`telegram`].

mod telegram;

pub use telegram::{TelegramGateway, TelegramGatewayBuilder};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A chat identity (user or group chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub i64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound messaging capability consumed by the monitor.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Deliver a plain-text message to one identity.
    async fn send_message(&self, to: Identity, text: &str) -> Result<(), GatewayError>;

    /// Lightweight round-trip used to measure latency.
    async fn get_self_identity(&self) -> Result<Identity, GatewayError>;
}
