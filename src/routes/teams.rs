use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use super::check_user;
use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Params, TeamAttrs},
    repository::NewTeam,
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Team not found".into())
}

#[get("")]
pub async fn list_teams(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let teams = state.repos.teams.list().await?;
    Ok(HttpResponse::Ok().json(teams))
}

/// Create a new team
///
/// The owner is optional: a team created without `owner_id` (or with `null`)
/// has no owner.
///
/// ## Responses:
/// - `201 Created`: the created team.
/// - `422 Unprocessable Entity`: blank name or unknown owner.
#[post("")]
pub async fn create_team(
    state: web::Data<AppState>,
    user: CurrentUser,
    params: web::Json<Params<TeamAttrs>>,
) -> Result<impl Responder, AppError> {
    let attrs = params.into_inner().into_inner();
    let owner_id = attrs.resolved_owner(None);

    let mut errors = attrs.check_for_create();
    check_user(&state, &mut errors, "owner", owner_id).await?;
    errors.into_result()?;

    let name = attrs.name.unwrap_or_default();
    let team = state.repos.teams.create(NewTeam { name, owner_id }).await?;
    log::info!("user {} created team {}", user.id(), team.id);

    Ok(HttpResponse::Created().json(team))
}

#[get("/{id}")]
pub async fn get_team(
    state: web::Data<AppState>,
    _user: CurrentUser,
    team_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let team = state
        .repos
        .teams
        .find_by_id(team_id.into_inner())
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(team))
}

#[put("/{id}")]
pub async fn update_team(
    state: web::Data<AppState>,
    _user: CurrentUser,
    team_id: web::Path<i64>,
    params: web::Json<Params<TeamAttrs>>,
) -> Result<impl Responder, AppError> {
    let team_id = team_id.into_inner();
    let team = state
        .repos
        .teams
        .find_by_id(team_id)
        .await?
        .ok_or_else(not_found)?;

    let attrs = params.into_inner().into_inner();
    let owner_id = attrs.resolved_owner(team.owner_id);

    let mut errors = attrs.check();
    if owner_id != team.owner_id {
        check_user(&state, &mut errors, "owner", owner_id).await?;
    }
    errors.into_result()?;

    let changes = NewTeam {
        name: attrs.name.unwrap_or(team.name),
        owner_id,
    };
    let team = state
        .repos
        .teams
        .update(team_id, changes)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(team))
}

/// Deletes the team together with its memberships and tasks.
#[delete("/{id}")]
pub async fn delete_team(
    state: web::Data<AppState>,
    user: CurrentUser,
    team_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let team_id = team_id.into_inner();
    if !state.repos.teams.delete(team_id).await? {
        return Err(not_found());
    }
    log::info!("user {} deleted team {}", user.id(), team_id);
    Ok(HttpResponse::NoContent().finish())
}
