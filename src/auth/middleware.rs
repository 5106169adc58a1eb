use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::CurrentUser;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Requests that may pass without a session token.
pub fn is_public(method: &Method, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    if method == Method::GET {
        path == "/health"
    } else if method == Method::POST {
        matches!(path, "/api/login" | "/api/sessions" | "/api/users")
    } else {
        false
    }
}

/// The credential is the last word of the `Authorization` header, so both
/// `Bearer <token>` and a bare token are accepted.
pub fn bearer_token(headers: &header::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_whitespace().last())
}

/// Verifies the session token on every protected request and binds the acting user.
///
/// Missing token: 401 "Authentication token required". Bad signature, malformed or
/// expired token: 401 "Authentication failed". A valid token whose user no longer
/// exists passes through without a `CurrentUser`; handlers that need one reject it.
pub struct AuthGuard;

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGuardService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGuardService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if is_public(req.method(), req.path()) {
            return Box::pin(async move {
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            });
        }

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(CurrentUser(user));
                }
                Ok(None) => {}
                // Answered here so outer middleware (CORS, logging) still sees a response.
                Err(e) => {
                    let response = e.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Runs the token checks for one request. `Ok(None)` means the token was valid but
/// its user is gone.
async fn authenticate(req: &ServiceRequest) -> Result<Option<User>, AppError> {
    let token = bearer_token(req.headers()).ok_or(AppError::AuthRequired)?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalServerError("Application state missing".into()))?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        log::warn!("rejected token on {} {}: {}", req.method(), req.path(), e);
        AppError::from(e)
    })?;

    let user = state.repos.users.find_by_id(user_id).await?;
    if user.is_none() {
        log::warn!("token for unknown user {} on {}", user_id, req.path());
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_public_routes() {
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::POST, "/api/login"));
        assert!(is_public(&Method::POST, "/api/sessions"));
        assert!(is_public(&Method::POST, "/api/users"));
        assert!(is_public(&Method::POST, "/api/users/"));

        assert!(!is_public(&Method::GET, "/api/users"));
        assert!(!is_public(&Method::GET, "/api/teams"));
        assert!(!is_public(&Method::POST, "/api/teams"));
        assert!(!is_public(&Method::DELETE, "/api/login"));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
