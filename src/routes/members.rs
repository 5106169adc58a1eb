use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use super::{check_team, check_user};
use crate::{
    auth::CurrentUser,
    error::{AppError, TAKEN},
    models::{MemberAttrs, MemberQuery, Params},
    repository::NewMember,
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Member not found".into())
}

/// List memberships
///
/// `?team_id=` restricts to one team, `?user_id=` to one user. When both are given the
/// team filter applies.
#[get("")]
pub async fn list_members(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<MemberQuery>,
) -> Result<impl Responder, AppError> {
    let members = state.repos.members.list(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// Adds a user to a team. A user can join a given team only once.
#[post("")]
pub async fn create_member(
    state: web::Data<AppState>,
    _user: CurrentUser,
    params: web::Json<Params<MemberAttrs>>,
) -> Result<impl Responder, AppError> {
    let attrs = params.into_inner().into_inner();

    let mut errors = attrs.check_for_create();
    check_user(&state, &mut errors, "user", attrs.user_id).await?;
    check_team(&state, &mut errors, "team", attrs.team_id).await?;
    if let (Some(team_id), Some(user_id)) = (attrs.team_id, attrs.user_id) {
        let existing = state
            .repos
            .members
            .find_by_team_and_user(team_id, user_id)
            .await?;
        if existing.is_some() {
            errors.add("user_id", TAKEN);
        }
    }
    errors.into_result()?;

    let (Some(user_id), Some(team_id)) = (attrs.user_id, attrs.team_id) else {
        return Err(AppError::BadRequest("user_id and team_id are required".into()));
    };
    let member = state
        .repos
        .members
        .create(NewMember {
            user_id,
            team_id,
            role: attrs.role.unwrap_or(0),
        })
        .await?;
    log::info!("user {} joined team {}", member.user_id, member.team_id);

    Ok(HttpResponse::Created().json(member))
}

#[get("/{id}")]
pub async fn get_member(
    state: web::Data<AppState>,
    _user: CurrentUser,
    member_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let member = state
        .repos
        .members
        .find_by_id(member_id.into_inner())
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(member))
}

/// Changes the member's role. `user_id` and `team_id` in the body are ignored.
#[put("/{id}")]
pub async fn update_member(
    state: web::Data<AppState>,
    _user: CurrentUser,
    member_id: web::Path<i64>,
    params: web::Json<Params<MemberAttrs>>,
) -> Result<impl Responder, AppError> {
    let member_id = member_id.into_inner();
    let member = state
        .repos
        .members
        .find_by_id(member_id)
        .await?
        .ok_or_else(not_found)?;

    let attrs = params.into_inner().into_inner();
    attrs.check().into_result()?;

    let Some(role) = attrs.role else {
        return Ok(HttpResponse::Ok().json(member));
    };
    let member = state
        .repos
        .members
        .update_role(member_id, role)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(member))
}

#[delete("/{id}")]
pub async fn delete_member(
    state: web::Data<AppState>,
    _user: CurrentUser,
    member_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    if !state.repos.members.delete(member_id.into_inner()).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}
