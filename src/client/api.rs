use reqwest::{header, Method, StatusCode};
use serde_json::Value;

use super::ClientError;

/// What the context should do after seeing a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    Continue,
    Logout,
}

/// Observes the status of every API response, successful or not.
pub trait ResponseHook {
    fn observe(&self, status: StatusCode) -> HookAction;
}

/// Any 401 ends the session, whatever the request was.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogoutOnUnauthorized;

impl ResponseHook for LogoutOnUnauthorized {
    fn observe(&self, status: StatusCode) -> HookAction {
        if status == StatusCode::UNAUTHORIZED {
            HookAction::Logout
        } else {
            HookAction::Continue
        }
    }
}

/// Thin JSON transport bound to the API root, e.g. `http://127.0.0.1:8080/api`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one request. The token, when given, goes out as `Authorization: Bearer`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

/// Turns a non-success response into `ClientError::Api`, keeping its JSON body.
pub(crate) async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        Err(_) => Value::Null,
    };
    ClientError::Api { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_only_on_unauthorized() {
        let hook = LogoutOnUnauthorized;
        assert_eq!(hook.observe(StatusCode::UNAUTHORIZED), HookAction::Logout);
        for status in [
            StatusCode::OK,
            StatusCode::NO_CONTENT,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::UNPROCESSABLE_ENTITY,
        ] {
            assert_eq!(hook.observe(status), HookAction::Continue);
        }
    }

    #[test]
    fn test_url_joining() {
        let api = ApiClient::new("http://localhost:8080/api/");
        assert_eq!(api.base_url(), "http://localhost:8080/api");
        assert_eq!(api.url("/teams/3"), "http://localhost:8080/api/teams/3");
        assert_eq!(api.url("login"), "http://localhost:8080/api/login");
    }
}
