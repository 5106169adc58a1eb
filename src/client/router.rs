use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref USER_EDIT: Regex = Regex::new(r"^/users/(\d+)/edit$").unwrap();
}

/// Who may enter a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    RequiresAuth,
    /// Only without a session; logged-in users are sent to the dashboard instead.
    GuestOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
    UserList,
    UserCreate,
    UserEdit(i64),
    TeamList,
    TeamCreate,
}

impl View {
    /// Where a fresh login lands.
    pub const LANDING: View = View::Dashboard;

    pub fn access(&self) -> Access {
        match self {
            View::Login => Access::GuestOnly,
            View::UserCreate => Access::Public,
            View::Dashboard
            | View::UserList
            | View::UserEdit(_)
            | View::TeamList
            | View::TeamCreate => Access::RequiresAuth,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::Login => "Login",
            View::Dashboard => "Dashboard",
            View::UserList => "UserList",
            View::UserCreate => "UserCreate",
            View::UserEdit(_) => "UserEdit",
            View::TeamList => "TeamList",
            View::TeamCreate => "TeamCreate",
        }
    }

    pub fn path(&self) -> String {
        match self {
            View::Login => "/login".to_string(),
            View::Dashboard => "/dashboard".to_string(),
            View::UserList => "/users".to_string(),
            View::UserCreate => "/users/new".to_string(),
            View::UserEdit(id) => format!("/users/{}/edit", id),
            View::TeamList => "/teams".to_string(),
            View::TeamCreate => "/teams/new".to_string(),
        }
    }

    /// Parses a location path. A trailing slash is ignored.
    pub fn from_path(path: &str) -> Option<View> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        let view = match path {
            "/login" => View::Login,
            "/" | "/dashboard" => View::Dashboard,
            "/users" => View::UserList,
            "/users/new" => View::UserCreate,
            "/teams" => View::TeamList,
            "/teams/new" => View::TeamCreate,
            other => {
                let captures = USER_EDIT.captures(other)?;
                View::UserEdit(captures[1].parse().ok()?)
            }
        };
        Some(view)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed(View),
    Redirect(View),
}

impl Navigation {
    /// The view actually shown.
    pub fn view(&self) -> View {
        match self {
            Navigation::Proceed(view) | Navigation::Redirect(view) => *view,
        }
    }
}

/// Decides where a navigation to `target` ends up.
pub fn guard(target: View, logged_in: bool) -> Navigation {
    match (target.access(), logged_in) {
        (Access::RequiresAuth, false) => Navigation::Redirect(View::Login),
        (Access::GuestOnly, true) => Navigation::Redirect(View::LANDING),
        _ => Navigation::Proceed(target),
    }
}

/// Current view plus the views visited before it.
#[derive(Debug, Clone)]
pub struct Router {
    current: View,
    history: Vec<View>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            current: View::Login,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn history(&self) -> &[View] {
        &self.history
    }

    /// Runs the guard and moves to whichever view it allows.
    pub fn push(&mut self, target: View, logged_in: bool) -> Navigation {
        let navigation = guard(target, logged_in);
        let view = navigation.view();
        if view != self.current {
            self.history.push(self.current);
            self.current = view;
        }
        if let Navigation::Redirect(to) = navigation {
            log::debug!("navigation to {} redirected to {}", target, to);
        }
        navigation
    }

    /// `None` when the path names no view.
    pub fn push_path(&mut self, path: &str, logged_in: bool) -> Option<Navigation> {
        View::from_path(path).map(|view| self.push(view, logged_in))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_redirects_guests_to_login() {
        for view in [View::Dashboard, View::UserList, View::UserEdit(3), View::TeamCreate] {
            assert_eq!(guard(view, false), Navigation::Redirect(View::Login));
            assert_eq!(guard(view, true), Navigation::Proceed(view));
        }
    }

    #[test]
    fn test_guard_sends_sessions_away_from_login() {
        assert_eq!(guard(View::Login, true), Navigation::Redirect(View::Dashboard));
        assert_eq!(guard(View::Login, false), Navigation::Proceed(View::Login));
    }

    #[test]
    fn test_public_views_always_proceed() {
        assert_eq!(guard(View::UserCreate, false), Navigation::Proceed(View::UserCreate));
        assert_eq!(guard(View::UserCreate, true), Navigation::Proceed(View::UserCreate));
    }

    #[test]
    fn test_paths() {
        let views = [
            View::Login,
            View::Dashboard,
            View::UserList,
            View::UserCreate,
            View::UserEdit(42),
            View::TeamList,
            View::TeamCreate,
        ];
        for view in views {
            assert_eq!(View::from_path(&view.path()), Some(view));
        }

        assert_eq!(View::from_path("/users/7/edit/"), Some(View::UserEdit(7)));
        assert_eq!(View::from_path("/"), Some(View::Dashboard));
        assert_eq!(View::from_path("/users/abc/edit"), None);
        assert_eq!(View::from_path("/projects"), None);
    }

    #[test]
    fn test_router_records_history() {
        let mut router = Router::new();
        assert_eq!(router.current(), View::Login);

        assert_eq!(
            router.push(View::TeamList, false),
            Navigation::Redirect(View::Login)
        );
        assert_eq!(router.current(), View::Login);
        assert!(router.history().is_empty());

        router.push(View::TeamList, true);
        router.push_path("/users/5/edit", true);
        assert_eq!(router.current(), View::UserEdit(5));
        assert_eq!(router.history(), &[View::Login, View::TeamList]);

        assert_eq!(router.push_path("/nowhere", true), None);
        assert_eq!(router.current(), View::UserEdit(5));
    }
}
