use actix_web::{post, web, HttpResponse, Responder};

use crate::{
    auth::{normalize_email, verify_password, AuthResponse, LoginRequest},
    error::AppError,
    models::UserSummary,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login user
///
/// Checks the credentials and returns `{token, user}`. Unknown emails and wrong
/// passwords get the same 401 so callers cannot probe for accounts.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    start_session(&state, login_data.into_inner()).await
}

/// Same as `/login`, under the resource-style name.
#[post("/sessions")]
pub async fn create_session(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    start_session(&state, login_data.into_inner()).await
}

async fn start_session(
    state: &AppState,
    credentials: LoginRequest,
) -> Result<HttpResponse, AppError> {
    let email = normalize_email(&credentials.email);
    let user = match state.repos.users.find_by_email(&email).await? {
        Some(user) => user,
        None => return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into())),
    };

    if !verify_password(&credentials.password, &user.password_hash)? {
        log::info!("failed login for user {}", user.id);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.tokens.issue(user.id)?;
    log::info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}
