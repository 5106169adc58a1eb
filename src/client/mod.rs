//! Headless client for the TeamForge API.
//!
//! `ClientContext` is what a frontend holds: the session (token and user, mirrored to
//! durable storage under `authToken`), the router with its per-view access rules, and
//! the HTTP client. Every API response passes through a `ResponseHook`; the default
//! one logs the session out on any 401.

pub mod api;
pub mod context;
pub mod router;
pub mod session;
pub mod storage;

use std::fmt;

use serde_json::Value;

pub use api::{ApiClient, HookAction, LogoutOnUnauthorized, ResponseHook};
pub use context::ClientContext;
pub use router::{guard, Access, Navigation, Router, View};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, SessionStorage, TOKEN_KEY};

/// Everything a client call can fail with.
#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a response, or its body could not be decoded.
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Api { status: u16, body: Value },
    /// A request body could not be encoded as JSON.
    Encode(String),
    /// Durable session storage could not be read or written.
    Storage(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The `error` message of an API failure body, if it has one.
    pub fn message(&self) -> Option<&str> {
        match self {
            ClientError::Api { body, .. } => body.get("error").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "Transport error: {}", e),
            ClientError::Api { status, body } => write!(f, "API error {}: {}", status, body),
            ClientError::Encode(msg) => write!(f, "Encode error: {}", msg),
            ClientError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Transport(error)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        ClientError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Storage(error.to_string())
    }
}
