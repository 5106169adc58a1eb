pub mod health;
pub mod members;
pub mod sessions;
pub mod tasks;
pub mod teams;
pub mod users;

use actix_web::web;

use crate::auth::AuthGuard;
use crate::error::{AppError, FieldErrors, MUST_EXIST};
use crate::state::AppState;

/// Registers the health probe and the guarded `/api` scope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(health::health)
        .service(
            web::scope("/api")
                .wrap(AuthGuard)
                .service(sessions::login)
                .service(sessions::create_session)
                .service(
                    web::scope("/users")
                        .service(users::list_users)
                        .service(users::create_user)
                        .service(users::get_user)
                        .service(users::update_user)
                        .service(users::delete_user),
                )
                .service(
                    web::scope("/teams")
                        .service(teams::list_teams)
                        .service(teams::create_team)
                        .service(teams::get_team)
                        .service(teams::update_team)
                        .service(teams::delete_team),
                )
                .service(
                    web::scope("/members")
                        .service(members::list_members)
                        .service(members::create_member)
                        .service(members::get_member)
                        .service(members::update_member)
                        .service(members::delete_member),
                )
                .service(
                    web::scope("/tasks")
                        .service(tasks::list_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                ),
        );
}

/// Malformed or mistyped JSON bodies become 400 `{"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Adds `must exist` under `association` when `id` names no user.
pub(crate) async fn check_user(
    state: &AppState,
    errors: &mut FieldErrors,
    association: &str,
    id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(id) = id {
        if state.repos.users.find_by_id(id).await?.is_none() {
            errors.add(association, MUST_EXIST);
        }
    }
    Ok(())
}

/// Adds `must exist` under `association` when `id` names no team.
pub(crate) async fn check_team(
    state: &AppState,
    errors: &mut FieldErrors,
    association: &str,
    id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(id) = id {
        if state.repos.teams.find_by_id(id).await?.is_none() {
            errors.add(association, MUST_EXIST);
        }
    }
    Ok(())
}
