use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    MemberRepository, NewMember, NewTask, NewTeam, NewUser, TaskRepository, TeamRepository,
    UserChanges, UserRepository,
};
use crate::error::{AppError, FieldErrors, DEPENDENT_TASKS, MUST_EXIST, TAKEN};
use crate::models::{Member, MemberQuery, Task, TaskQuery, Team, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    teams: BTreeMap<i64, Team>,
    members: BTreeMap<i64, Member>,
    tasks: BTreeMap<i64, Task>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_task_refs(&self, data: &NewTask) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if !self.teams.contains_key(&data.team_id) {
            errors.add("team", MUST_EXIST);
        }
        if !self.users.contains_key(&data.assignee_id) {
            errors.add("assignee", MUST_EXIST);
        }
        errors.into_result()
    }

    fn check_owner(&self, owner_id: Option<i64>) -> Result<(), AppError> {
        match owner_id {
            Some(id) if !self.users.contains_key(&id) => {
                Err(AppError::ValidationFailed(FieldErrors::single("owner", MUST_EXIST)))
            }
            _ => Ok(()),
        }
    }
}

/// Process-local store with the same constraints as the PostgreSQL schema.
///
/// Ids come from one shared sequence, so they never repeat across tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, data: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&data.email, None) {
            return Err(AppError::ValidationFailed(FieldErrors::single("email", TAKEN)));
        }

        let id = tables.next_id();
        let now = Utc::now();
        let user = User {
            id,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.users.contains_key(&id) && tables.email_taken(email, Some(id)) {
                return Err(AppError::ValidationFailed(FieldErrors::single("email", TAKEN)));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Ok(false);
        }
        if tables.tasks.values().any(|t| t.assignee_id == id) {
            return Err(AppError::ValidationFailed(FieldErrors::single(
                "base",
                DEPENDENT_TASKS,
            )));
        }

        tables.users.remove(&id);
        tables.members.retain(|_, m| m.user_id != id);
        for team in tables.teams.values_mut() {
            if team.owner_id == Some(id) {
                team.owner_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Team>, AppError> {
        Ok(self.tables.read().await.teams.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Team>, AppError> {
        Ok(self.tables.read().await.teams.get(&id).cloned())
    }

    async fn create(&self, data: NewTeam) -> Result<Team, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_owner(data.owner_id)?;

        let id = tables.next_id();
        let now = Utc::now();
        let team = Team {
            id,
            name: data.name,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.teams.insert(id, team.clone());
        Ok(team)
    }

    async fn update(&self, id: i64, data: NewTeam) -> Result<Option<Team>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&id) {
            return Ok(None);
        }
        tables.check_owner(data.owner_id)?;

        let Some(team) = tables.teams.get_mut(&id) else {
            return Ok(None);
        };
        team.name = data.name;
        team.owner_id = data.owner_id;
        team.updated_at = Utc::now();
        Ok(Some(team.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.teams.remove(&id).is_none() {
            return Ok(false);
        }
        tables.members.retain(|_, m| m.team_id != id);
        tables.tasks.retain(|_, t| t.team_id != id);
        Ok(true)
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn list(&self, query: MemberQuery) -> Result<Vec<Member>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .filter(|m| query.matches(m))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, AppError> {
        Ok(self.tables.read().await.members.get(&id).cloned())
    }

    async fn find_by_team_and_user(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<Member>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn create(&self, data: NewMember) -> Result<Member, AppError> {
        let mut tables = self.tables.write().await;

        let mut errors = FieldErrors::new();
        if !tables.users.contains_key(&data.user_id) {
            errors.add("user", MUST_EXIST);
        }
        if !tables.teams.contains_key(&data.team_id) {
            errors.add("team", MUST_EXIST);
        }
        if tables
            .members
            .values()
            .any(|m| m.team_id == data.team_id && m.user_id == data.user_id)
        {
            errors.add("user_id", TAKEN);
        }
        errors.into_result()?;

        let id = tables.next_id();
        let now = Utc::now();
        let member = Member {
            id,
            user_id: data.user_id,
            team_id: data.team_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        tables.members.insert(id, member.clone());
        Ok(member)
    }

    async fn update_role(&self, id: i64, role: i32) -> Result<Option<Member>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.members.get_mut(&id).map(|member| {
            member.role = role;
            member.updated_at = Utc::now();
            member.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.members.remove(&id).is_some())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn list(&self, query: TaskQuery) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, AppError> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn create(&self, data: NewTask) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_task_refs(&data)?;

        let id = tables.next_id();
        let now = Utc::now();
        let task = Task {
            id,
            title: data.title,
            body: data.body,
            status: data.status,
            team_id: data.team_id,
            assignee_id: data.assignee_id,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: i64, data: NewTask) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.contains_key(&id) {
            return Ok(None);
        }
        tables.check_task_refs(&data)?;

        let Some(task) = tables.tasks.get_mut(&id) else {
            return Ok(None);
        };
        task.title = data.title;
        task.body = data.body;
        task.status = data.status;
        task.team_id = data.team_id;
        task.assignee_id = data.assignee_id;
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repositories;

    fn repos() -> Repositories {
        Repositories::in_memory()
    }

    async fn user(repos: &Repositories, email: &str) -> User {
        repos
            .users
            .create(NewUser {
                email: email.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
    }

    async fn team(repos: &Repositories, owner_id: Option<i64>) -> Team {
        repos
            .teams
            .create(NewTeam {
                name: "Core".into(),
                owner_id,
            })
            .await
            .unwrap()
    }

    fn new_task(team_id: i64, assignee_id: i64) -> NewTask {
        NewTask {
            title: "t".into(),
            body: "b".into(),
            status: 0,
            team_id,
            assignee_id,
        }
    }

    #[actix_rt::test]
    async fn test_duplicate_email_rejected() {
        let repos = repos();
        user(&repos, "a@x.com").await;
        let result = repos
            .users
            .create(NewUser {
                email: "a@x.com".into(),
                password_hash: "h".into(),
            })
            .await;
        match result {
            Err(AppError::ValidationFailed(errors)) => {
                assert_eq!(errors.get("email"), Some(&[TAKEN.to_string()][..]))
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_member_uniqueness_and_references() {
        let repos = repos();
        let alice = user(&repos, "a@x.com").await;
        let team = team(&repos, None).await;

        let data = NewMember {
            user_id: alice.id,
            team_id: team.id,
            role: 0,
        };
        repos.members.create(data.clone()).await.unwrap();

        match repos.members.create(data).await {
            Err(AppError::ValidationFailed(errors)) => {
                assert_eq!(errors.get("user_id"), Some(&[TAKEN.to_string()][..]))
            }
            other => panic!("Unexpected result: {:?}", other),
        }

        let dangling = NewMember {
            user_id: 999,
            team_id: team.id,
            role: 0,
        };
        match repos.members.create(dangling).await {
            Err(AppError::ValidationFailed(errors)) => {
                assert_eq!(errors.get("user"), Some(&[MUST_EXIST.to_string()][..]))
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_team_delete_cascades() {
        let repos = repos();
        let alice = user(&repos, "a@x.com").await;
        let team = team(&repos, Some(alice.id)).await;
        repos
            .members
            .create(NewMember {
                user_id: alice.id,
                team_id: team.id,
                role: 1,
            })
            .await
            .unwrap();
        repos.tasks.create(new_task(team.id, alice.id)).await.unwrap();

        assert!(repos.teams.delete(team.id).await.unwrap());
        assert!(repos.members.list(MemberQuery::default()).await.unwrap().is_empty());
        assert!(repos.tasks.list(TaskQuery::default()).await.unwrap().is_empty());
        assert!(!repos.teams.delete(team.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_user_delete_rules() {
        let repos = repos();
        let alice = user(&repos, "a@x.com").await;
        let bob = user(&repos, "b@x.com").await;
        let team = team(&repos, Some(bob.id)).await;
        repos.tasks.create(new_task(team.id, alice.id)).await.unwrap();
        repos
            .members
            .create(NewMember {
                user_id: bob.id,
                team_id: team.id,
                role: 0,
            })
            .await
            .unwrap();

        assert!(matches!(
            repos.users.delete(alice.id).await,
            Err(AppError::ValidationFailed(_))
        ));

        assert!(repos.users.delete(bob.id).await.unwrap());
        let team = repos.teams.find_by_id(team.id).await.unwrap().unwrap();
        assert_eq!(team.owner_id, None);
        assert!(repos
            .members
            .list(MemberQuery::for_user(bob.id))
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_rt::test]
    async fn test_task_references_checked() {
        let repos = repos();
        let alice = user(&repos, "a@x.com").await;
        match repos.tasks.create(new_task(42, alice.id)).await {
            Err(AppError::ValidationFailed(errors)) => {
                assert_eq!(errors.get("team"), Some(&[MUST_EXIST.to_string()][..]))
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_unknown_ids() {
        let repos = repos();
        assert!(repos.tasks.find_by_id(1).await.unwrap().is_none());
        assert!(!repos.tasks.delete(1).await.unwrap());
        assert!(repos.members.update_role(1, 2).await.unwrap().is_none());
        assert!(repos
            .users
            .update(1, UserChanges::default())
            .await
            .unwrap()
            .is_none());
    }
}
