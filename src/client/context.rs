use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::api::{api_error, ApiClient, HookAction, LogoutOnUnauthorized, ResponseHook};
use super::router::{Navigation, Router, View};
use super::session::SessionStore;
use super::storage::SessionStorage;
use super::ClientError;
use crate::auth::{AuthResponse, LoginRequest};
use crate::models::{
    Member, MemberAttrs, MemberQuery, ParamKey, Params, Task, TaskAttrs, TaskQuery, Team,
    TeamAttrs, User, UserAttrs,
};

fn wrapped<T: Serialize + ParamKey>(attrs: T) -> Result<Value, ClientError> {
    serde_json::to_value(Params(attrs)).map_err(|e| ClientError::Encode(e.to_string()))
}

fn id_path(resource: &str, id: i64) -> String {
    format!("/{}/{}", resource, id)
}

/// Session, router and transport of one client, driven through `&mut self`.
pub struct ClientContext<H = LogoutOnUnauthorized> {
    api: ApiClient,
    session: SessionStore,
    router: Router,
    hook: H,
}

impl ClientContext<LogoutOnUnauthorized> {
    pub fn new(api: ApiClient, storage: impl SessionStorage + 'static) -> Self {
        Self::with_hook(api, storage, LogoutOnUnauthorized)
    }
}

impl<H: ResponseHook> ClientContext<H> {
    pub fn with_hook(api: ApiClient, storage: impl SessionStorage + 'static, hook: H) -> Self {
        Self {
            api,
            session: SessionStore::new(storage),
            router: Router::new(),
            hook,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Restores a persisted session, if any.
    pub fn initialize(&mut self) -> Result<(), ClientError> {
        self.session.initialize()
    }

    pub fn navigate(&mut self, target: View) -> Navigation {
        self.router.push(target, self.session.is_logged_in())
    }

    pub fn navigate_path(&mut self, path: &str) -> Option<Navigation> {
        self.router.push_path(path, self.session.is_logged_in())
    }

    /// Logs in and moves to the dashboard.
    ///
    /// On failure the session is cleared and the error returned unchanged.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let credentials = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body = serde_json::to_value(&credentials)
            .map_err(|e| ClientError::Encode(e.to_string()))?;

        match self
            .fetch::<AuthResponse>(Method::POST, "/login", &[], Some(body))
            .await
        {
            Ok(auth) => {
                self.session.establish(auth.token.clone(), auth.user.clone())?;
                log::info!("logged in as user {}", auth.user.id);
                self.navigate(View::LANDING);
                Ok(auth)
            }
            Err(error) => {
                log::warn!("login failed: {}", error);
                // The hook may already have cleared it; clearing twice is harmless.
                self.session.clear()?;
                Err(error)
            }
        }
    }

    /// Drops the session and returns to the login view.
    pub fn logout(&mut self) -> Result<Navigation, ClientError> {
        let cleared = self.session.clear();
        let navigation = self.router.push(View::Login, false);
        cleared.map(|_| navigation)
    }

    async fn execute(
        &mut self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let token = self.session.token().map(str::to_owned);
        let response = self
            .api
            .send(method, path, token.as_deref(), query, body.as_ref())
            .await?;

        let status = response.status();
        if self.hook.observe(status) == HookAction::Logout {
            log::info!("{} from {}, ending session", status, path);
            self.logout()?;
        }

        if status.is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let response = self.execute(method, path, query, body).await?;
        Ok(response.json::<T>().await?)
    }

    async fn remove(&mut self, resource: &str, id: i64) -> Result<(), ClientError> {
        self.execute(Method::DELETE, &id_path(resource, id), &[], None)
            .await
            .map(|_| ())
    }

    pub async fn users(&mut self) -> Result<Vec<User>, ClientError> {
        self.fetch(Method::GET, "/users", &[], None).await
    }

    pub async fn user(&mut self, id: i64) -> Result<User, ClientError> {
        self.fetch(Method::GET, &id_path("users", id), &[], None).await
    }

    pub async fn create_user(&mut self, attrs: UserAttrs) -> Result<User, ClientError> {
        let body = wrapped(attrs)?;
        self.fetch(Method::POST, "/users", &[], Some(body)).await
    }

    pub async fn update_user(&mut self, id: i64, attrs: UserAttrs) -> Result<User, ClientError> {
        let body = wrapped(attrs)?;
        self.fetch(Method::PUT, &id_path("users", id), &[], Some(body)).await
    }

    pub async fn delete_user(&mut self, id: i64) -> Result<(), ClientError> {
        self.remove("users", id).await
    }

    pub async fn teams(&mut self) -> Result<Vec<Team>, ClientError> {
        self.fetch(Method::GET, "/teams", &[], None).await
    }

    pub async fn team(&mut self, id: i64) -> Result<Team, ClientError> {
        self.fetch(Method::GET, &id_path("teams", id), &[], None).await
    }

    pub async fn create_team(&mut self, attrs: TeamAttrs) -> Result<Team, ClientError> {
        let body = wrapped(attrs)?;
        self.fetch(Method::POST, "/teams", &[], Some(body)).await
    }

    pub async fn update_team(&mut self, id: i64, attrs: TeamAttrs) -> Result<Team, ClientError> {
        let body = wrapped(attrs)?;
        self.fetch(Method::PUT, &id_path("teams", id), &[], Some(body)).await
    }

    pub async fn delete_team(&mut self, id: i64) -> Result<(), ClientError> {
        self.remove("teams", id).await
    }

    pub async fn members(&mut self, query: MemberQuery) -> Result<Vec<Member>, ClientError> {
        let mut params = Vec::new();
        if let Some(team_id) = query.team_id {
            params.push(("team_id", team_id.to_string()));
        }
        if let Some(user_id) = query.user_id {
            params.push(("user_id", user_id.to_string()));
        }
        self.fetch(Method::GET, "/members", &params, None).await
    }

    pub async fn members_for_team(&mut self, team_id: i64) -> Result<Vec<Member>, ClientError> {
        self.members(MemberQuery::for_team(team_id)).await
    }

    pub async fn create_member(&mut self, attrs: MemberAttrs) -> Result<Member, ClientError> {
        let body = wrapped(attrs)?;
        self.fetch(Method::POST, "/members", &[], Some(body)).await
    }

    pub async fn update_member(&mut self, id: i64, role: i32) -> Result<Member, ClientError> {
        let body = wrapped(MemberAttrs {
            role: Some(role),
            ..MemberAttrs::default()
        })?;
        self.fetch(Method::PUT, &id_path("members", id), &[], Some(body)).await
    }

    pub async fn delete_member(&mut self, id: i64) -> Result<(), ClientError> {
        self.remove("members", id).await
    }

    pub async fn tasks(&mut self, query: TaskQuery) -> Result<Vec<Task>, ClientError> {
        let mut params = Vec::new();
        if let Some(team_id) = query.team_id {
            params.push(("team_id", team_id.to_string()));
        }
        if let Some(assignee_id) = query.assignee_id {
            params.push(("assignee_id", assignee_id.to_string()));
        }
        if let Some(status) = query.status {
            params.push(("status", status.to_string()));
        }
        self.fetch(Method::GET, "/tasks", &params, None).await
    }

    pub async fn task(&mut self, id: i64) -> Result<Task, ClientError> {
        self.fetch(Method::GET, &id_path("tasks", id), &[], None).await
    }

    pub async fn create_task(&mut self, attrs: TaskAttrs) -> Result<Task, ClientError> {
        let body = wrapped(attrs)?;
        self.fetch(Method::POST, "/tasks", &[], Some(body)).await
    }

    pub async fn update_task(&mut self, id: i64, attrs: TaskAttrs) -> Result<Task, ClientError> {
        let body = wrapped(attrs)?;
        self.fetch(Method::PUT, &id_path("tasks", id), &[], Some(body)).await
    }

    pub async fn delete_task(&mut self, id: i64) -> Result<(), ClientError> {
        self.remove("tasks", id).await
    }
}
