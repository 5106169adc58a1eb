use crate::auth::TokenCodec;
use crate::repository::Repositories;

/// Shared, immutable application state handed to every handler via `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub tokens: TokenCodec,
}

impl AppState {
    pub fn new(repos: Repositories, tokens: TokenCodec) -> Self {
        Self { repos, tokens }
    }
}
