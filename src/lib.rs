#![doc = "The `teamforge` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, authentication, routing and error handling for the"]
#![doc = "TeamForge API, plus the `client` module: a headless session store, route guard and"]
#![doc = "HTTP client for talking to the API from another Rust program."]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;

pub use crate::error::AppError;
pub use crate::state::AppState;
