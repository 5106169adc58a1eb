use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    MemberRepository, NewMember, NewTask, NewTeam, NewUser, TaskRepository, TeamRepository,
    UserChanges, UserRepository,
};
use crate::error::{AppError, FieldErrors, DEPENDENT_TASKS, MUST_EXIST, TAKEN};
use crate::models::{Member, MemberQuery, Task, TaskQuery, Team, User};

const USER_COLUMNS: &str = "id, email, password_hash, created_at, updated_at";
const TEAM_COLUMNS: &str = "id, name, owner_id, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, user_id, team_id, role, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, body, status, team_id, assignee_id, created_at, updated_at";

/// Translates constraint violations named in `migrations/` into field errors.
fn constraint_error(error: sqlx::Error) -> AppError {
    let field_error = match &error {
        sqlx::Error::Database(db) => match db.constraint() {
            Some("users_email_key") => Some(("email", TAKEN)),
            Some("members_team_id_user_id_key") => Some(("user_id", TAKEN)),
            Some("members_user_id_fkey") => Some(("user", MUST_EXIST)),
            Some("members_team_id_fkey") => Some(("team", MUST_EXIST)),
            Some("teams_owner_id_fkey") => Some(("owner", MUST_EXIST)),
            Some("tasks_team_id_fkey") => Some(("team", MUST_EXIST)),
            // Raised both for a missing assignee and for deleting an assigned user.
            Some("tasks_assignee_id_fkey") if db.message().starts_with("update or delete") => {
                Some(("base", DEPENDENT_TASKS))
            }
            Some("tasks_assignee_id_fkey") => Some(("assignee", MUST_EXIST)),
            _ => None,
        },
        _ => None,
    };

    match field_error {
        Some((field, message)) => AppError::ValidationFailed(FieldErrors::single(field, message)),
        None => AppError::from(error),
    }
}

/// PostgreSQL-backed repositories over a shared `PgPool`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, data: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(data.email)
            .bind(data.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users
             SET email = COALESCE($1, email),
                 password_hash = COALESCE($2, password_hash),
                 updated_at = NOW()
             WHERE id = $3
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(constraint_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TeamRepository for PgStore {
    async fn list(&self) -> Result<Vec<Team>, AppError> {
        let sql = format!("SELECT {} FROM teams ORDER BY id", TEAM_COLUMNS);
        Ok(sqlx::query_as::<_, Team>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Team>, AppError> {
        let sql = format!("SELECT {} FROM teams WHERE id = $1", TEAM_COLUMNS);
        Ok(sqlx::query_as::<_, Team>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, data: NewTeam) -> Result<Team, AppError> {
        let sql = format!(
            "INSERT INTO teams (name, owner_id) VALUES ($1, $2) RETURNING {}",
            TEAM_COLUMNS
        );
        sqlx::query_as::<_, Team>(&sql)
            .bind(data.name)
            .bind(data.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn update(&self, id: i64, data: NewTeam) -> Result<Option<Team>, AppError> {
        let sql = format!(
            "UPDATE teams SET name = $1, owner_id = $2, updated_at = NOW()
             WHERE id = $3
             RETURNING {}",
            TEAM_COLUMNS
        );
        sqlx::query_as::<_, Team>(&sql)
            .bind(data.name)
            .bind(data.owner_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        // Members and tasks go with the team via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MemberRepository for PgStore {
    async fn list(&self, query: MemberQuery) -> Result<Vec<Member>, AppError> {
        let members = match (query.team_id, query.user_id) {
            (Some(team_id), _) => {
                let sql = format!(
                    "SELECT {} FROM members WHERE team_id = $1 ORDER BY id",
                    MEMBER_COLUMNS
                );
                sqlx::query_as::<_, Member>(&sql)
                    .bind(team_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(user_id)) => {
                let sql = format!(
                    "SELECT {} FROM members WHERE user_id = $1 ORDER BY id",
                    MEMBER_COLUMNS
                );
                sqlx::query_as::<_, Member>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                let sql = format!("SELECT {} FROM members ORDER BY id", MEMBER_COLUMNS);
                sqlx::query_as::<_, Member>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(members)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, AppError> {
        let sql = format!("SELECT {} FROM members WHERE id = $1", MEMBER_COLUMNS);
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_team_and_user(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<Member>, AppError> {
        let sql = format!(
            "SELECT {} FROM members WHERE team_id = $1 AND user_id = $2",
            MEMBER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, data: NewMember) -> Result<Member, AppError> {
        let sql = format!(
            "INSERT INTO members (user_id, team_id, role) VALUES ($1, $2, $3) RETURNING {}",
            MEMBER_COLUMNS
        );
        sqlx::query_as::<_, Member>(&sql)
            .bind(data.user_id)
            .bind(data.team_id)
            .bind(data.role)
            .fetch_one(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn update_role(&self, id: i64, role: i32) -> Result<Option<Member>, AppError> {
        let sql = format!(
            "UPDATE members SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            MEMBER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(role)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn list(&self, query: TaskQuery) -> Result<Vec<Task>, AppError> {
        // NULL parameters disable their filter.
        let sql = format!(
            "SELECT {} FROM tasks
             WHERE ($1::BIGINT IS NULL OR team_id = $1)
               AND ($2::BIGINT IS NULL OR assignee_id = $2)
               AND ($3::INTEGER IS NULL OR status = $3)
             ORDER BY id",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(query.team_id)
            .bind(query.assignee_id)
            .bind(query.status)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, data: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (title, body, status, team_id, assignee_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(data.title)
            .bind(data.body)
            .bind(data.status)
            .bind(data.team_id)
            .bind(data.assignee_id)
            .fetch_one(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn update(&self, id: i64, data: NewTask) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks
             SET title = $1, body = $2, status = $3, team_id = $4, assignee_id = $5,
                 updated_at = NOW()
             WHERE id = $6
             RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(data.title)
            .bind(data.body)
            .bind(data.status)
            .bind(data.team_id)
            .bind(data.assignee_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
