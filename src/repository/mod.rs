//! Persistence for users, teams, members and tasks.
//!
//! Handlers talk to the traits in this module. `PgStore` backs them with PostgreSQL;
//! `MemoryStore` keeps everything in process and enforces the same uniqueness,
//! foreign-key and cascade rules, so the HTTP layer behaves identically on both.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{Member, MemberQuery, Task, TaskQuery, Team, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub user_id: i64,
    pub team_id: i64,
    pub role: i32,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub body: String,
    pub status: i32,
    pub team_id: i64,
    pub assignee_id: i64,
}

/// `update` returns `Ok(None)` and `delete` returns `Ok(false)` when the id is unknown.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn create(&self, data: NewUser) -> Result<User, AppError>;
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Team>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Team>, AppError>;
    async fn create(&self, data: NewTeam) -> Result<Team, AppError>;
    async fn update(&self, id: i64, data: NewTeam) -> Result<Option<Team>, AppError>;
    /// Also removes the team's members and tasks.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn list(&self, query: MemberQuery) -> Result<Vec<Member>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, AppError>;
    async fn find_by_team_and_user(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<Member>, AppError>;
    /// Fails with a `user_id` uniqueness error when the pair already exists.
    async fn create(&self, data: NewMember) -> Result<Member, AppError>;
    async fn update_role(&self, id: i64, role: i32) -> Result<Option<Member>, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list(&self, query: TaskQuery) -> Result<Vec<Task>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, AppError>;
    async fn create(&self, data: NewTask) -> Result<Task, AppError>;
    async fn update(&self, id: i64, data: NewTask) -> Result<Option<Task>, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// One handle per entity, shared by every handler through `AppState`.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    /// `"postgres"` or `"memory"`, reported by the health probe.
    pub backend: &'static str,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            users: store.clone(),
            teams: store.clone(),
            members: store.clone(),
            tasks: store,
            backend: "postgres",
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            teams: store.clone(),
            members: store.clone(),
            tasks: store,
            backend: "memory",
        }
    }
}
