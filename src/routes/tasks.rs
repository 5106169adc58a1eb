use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use super::{check_team, check_user};
use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Params, TaskAttrs, TaskQuery},
    repository::NewTask,
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Validates `attrs` as a complete task and checks that its team and assignee exist.
async fn checked_record(state: &AppState, attrs: TaskAttrs) -> Result<NewTask, AppError> {
    let mut errors = attrs.check();
    check_team(state, &mut errors, "team", attrs.team_id).await?;
    check_user(state, &mut errors, "assignee", attrs.assignee_id).await?;
    errors.into_result()?;
    attrs.into_record()
}

/// Get all tasks
///
/// Filters: `team_id`, `assignee_id`, `status`. Tasks are returned in id order.
#[get("")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = state.repos.tasks.list(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Create a new task
///
/// ## Request Body:
/// `{"task": {"title", "body", "status", "team_id", "assignee_id"}}`, or the same
/// attributes unwrapped.
///
/// ## Responses:
/// - `201 Created`: the created task.
/// - `422 Unprocessable Entity`: field-keyed messages such as `{"title": ["can't be blank"]}`.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    params: web::Json<Params<TaskAttrs>>,
) -> Result<impl Responder, AppError> {
    let record = checked_record(&state, params.into_inner().into_inner()).await?;
    let task = state.repos.tasks.create(record).await?;
    log::info!("user {} created task {}", user.id(), task.id);

    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    _user: CurrentUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = state
        .repos
        .tasks
        .find_by_id(task_id.into_inner())
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Update a task
///
/// Absent attributes keep their stored value; the merged task must still be valid.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    _user: CurrentUser,
    task_id: web::Path<i64>,
    params: web::Json<Params<TaskAttrs>>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    let existing = state
        .repos
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or_else(not_found)?;

    let attrs = params.into_inner().into_inner().merged_onto(&existing);
    let record = checked_record(&state, attrs).await?;
    let task = state
        .repos
        .tasks
        .update(task_id, record)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    if !state.repos.tasks.delete(task_id).await? {
        return Err(not_found());
    }
    log::info!("user {} deleted task {}", user.id(), task_id);
    Ok(HttpResponse::NoContent().finish())
}
