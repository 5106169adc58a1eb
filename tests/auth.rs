mod common;

use actix_cors::Cors;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use teamforge::auth::token;
use teamforge::auth::AuthResponse;
use teamforge::routes;

use common::{bearer, seed_user, state, token_for, SECRET};

#[test_log::test(actix_rt::test)]
async fn test_login_then_protected_request() {
    let state = state();
    let user = seed_user(&state, "a@x.com", "p").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "a@x.com", "password": "p" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let login: AuthResponse = test::read_body_json(resp).await;
    assert!(!login.token.is_empty());
    assert_eq!(login.user.id, user.id);
    assert_eq!(login.user.email, "a@x.com");
    assert_eq!(token::verify(&login.token, SECRET).unwrap(), user.id);

    let req = test::TestRequest::get()
        .uri("/api/teams")
        .insert_header(bearer(&login.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let teams: Value = test::read_body_json(resp).await;
    assert_eq!(teams, json!([]));
}

#[actix_rt::test]
async fn test_sessions_alias_and_bad_credentials() {
    let state = state();
    seed_user(&state, "a@x.com", "p").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    // Email lookup ignores case and surrounding whitespace.
    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(json!({ "email": " A@X.com", "password": "p" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    for payload in [
        json!({ "email": "a@x.com", "password": "wrong" }),
        json!({ "email": "nobody@x.com", "password": "p" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid email or password" }));
    }

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "a@x.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_missing_token_is_rejected() {
    let state = state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    for uri in ["/api/teams", "/api/tasks", "/api/members", "/api/users"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Authentication token required" }));
    }

    // Health stays public.
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_rejections_carry_cors_headers() {
    let state = state();
    let user = seed_user(&state, "a@x.com", "p").await;
    let origin = "http://localhost:5173";
    let app = test::init_service(
        App::new()
            .wrap(
                Cors::default()
                    .allowed_origin(origin)
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/teams")
        .insert_header((header::ORIGIN, origin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        origin
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Authentication token required" }));

    let req = test::TestRequest::get()
        .uri("/api/teams")
        .insert_header((header::ORIGIN, origin))
        .insert_header(bearer("garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        origin
    );

    let req = test::TestRequest::get()
        .uri("/api/teams")
        .insert_header((header::ORIGIN, origin))
        .insert_header(bearer(&token_for(&state, &user)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        origin
    );
}

#[actix_rt::test]
async fn test_bad_tokens_fail_authentication() {
    let state = state();
    let user = seed_user(&state, "a@x.com", "p").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let valid = token_for(&state, &user);
    let (unsigned, signature) = valid.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

    let expired = token::issue_at(
        user.id,
        SECRET,
        Utc::now() - Duration::hours(25),
        Utc::now() - Duration::hours(1),
    )
    .unwrap();
    let foreign = token::issue(user.id, "another-secret", Utc::now() + Duration::hours(1)).unwrap();

    for bad in [tampered, expired, foreign, "garbage".to_string()] {
        let req = test::TestRequest::get()
            .uri("/api/teams")
            .insert_header(bearer(&bad))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Authentication failed" }));
    }
}

#[actix_rt::test]
async fn test_token_of_deleted_user_is_rejected() {
    let state = state();
    let user = seed_user(&state, "gone@x.com", "p").await;
    let token = token_for(&state, &user);
    assert!(state.repos.users.delete(user.id).await.unwrap());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Authentication failed" }));
}

#[actix_rt::test]
async fn test_sign_up_is_public() {
    let state = state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "user": { "email": "New@X.com", "password": "secret" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "new@x.com");
    assert!(body.get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "email": "new@x.com", "password": "other" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "email": ["has already been taken"] }));

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "email": ["is invalid"], "password": ["can't be blank"] })
    );
}
