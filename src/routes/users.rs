use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use crate::{
    auth::{hash_password, normalize_email, CurrentUser},
    error::AppError,
    models::{Params, UserAttrs},
    repository::{NewUser, UserChanges},
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

/// Lists every user, ordered by id.
#[get("")]
pub async fn list_users(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let users = state.repos.users.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Registers a new account. This route is public.
///
/// ## Responses:
/// - `201 Created`: the new user (without its credential hash).
/// - `422 Unprocessable Entity`: blank or invalid email, email taken, missing password.
#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    params: web::Json<Params<UserAttrs>>,
) -> Result<impl Responder, AppError> {
    let attrs = params.into_inner().into_inner();
    attrs.check_for_create().into_result()?;

    let (Some(email), Some(password)) = (attrs.email, attrs.password) else {
        return Err(AppError::BadRequest("email and password are required".into()));
    };
    let email = normalize_email(&email);
    // Duplicate emails surface from the store as `{"email": ["has already been taken"]}`.
    let user = state
        .repos
        .users
        .create(NewUser {
            email,
            password_hash: hash_password(&password)?,
        })
        .await?;
    log::info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(user))
}

#[get("/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    _user: CurrentUser,
    user_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let user = state
        .repos
        .users
        .find_by_id(user_id.into_inner())
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(user))
}

/// Changes email and/or password. Absent fields are left as they are.
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    _user: CurrentUser,
    user_id: web::Path<i64>,
    params: web::Json<Params<UserAttrs>>,
) -> Result<impl Responder, AppError> {
    let user_id = user_id.into_inner();
    if state.repos.users.find_by_id(user_id).await?.is_none() {
        return Err(not_found());
    }

    let attrs = params.into_inner().into_inner();
    attrs.check().into_result()?;

    let password_hash = match &attrs.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let changes = UserChanges {
        email: attrs.email.as_deref().map(normalize_email),
        password_hash,
    };

    let user = state
        .repos
        .users
        .update(user_id, changes)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(user))
}

#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    _user: CurrentUser,
    user_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    if !state.repos.users.delete(user_id.into_inner()).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}
