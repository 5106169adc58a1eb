#![allow(dead_code)]

use actix_web::http::header;
use chrono::Duration;
use teamforge::auth::TokenCodec;
use teamforge::models::{Team, User};
use teamforge::repository::{NewTeam, NewUser, Repositories};
use teamforge::AppState;

pub const SECRET: &str = "integration-test-secret";

/// Fresh in-memory state with a one-day token lifetime.
pub fn state() -> AppState {
    AppState::new(
        Repositories::in_memory(),
        TokenCodec::new(SECRET, Duration::hours(24)),
    )
}

/// Inserts a user directly. A low bcrypt cost keeps the suite fast.
pub async fn seed_user(state: &AppState, email: &str, password: &str) -> User {
    let password_hash = bcrypt::hash(password, 4).expect("hash");
    state
        .repos
        .users
        .create(NewUser {
            email: email.to_string(),
            password_hash,
        })
        .await
        .expect("seed user")
}

pub async fn seed_team(state: &AppState, name: &str, owner_id: Option<i64>) -> Team {
    state
        .repos
        .teams
        .create(NewTeam {
            name: name.to_string(),
            owner_id,
        })
        .await
        .expect("seed team")
}

pub fn token_for(state: &AppState, user: &User) -> String {
    state.tokens.issue(user.id).expect("issue token")
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}
