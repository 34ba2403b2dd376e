//! End-to-end flows through the HTTP router

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::models::Role;
use staffbook_server::api::create_router;
use staffbook_server::services::auth::ensure_account;
use staffbook_server::{AppState, Config};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    config: Config,
}

impl TestApp {
    fn new() -> Self {
        let config = Config::for_tests();
        let state = AppState::in_memory(&config);
        Self {
            router: create_router(state),
            config,
        }
    }

    async fn with_admin() -> (Self, String) {
        let config = Config::for_tests();
        let state = AppState::in_memory(&config);
        ensure_account(&state, &config.admin, Role::SystemAdmin, "System")
            .await
            .unwrap();
        let app = Self {
            router: create_router(state),
            config,
        };
        let (status, body) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({
                    "email": app.config.admin.email,
                    "password": app.config.admin.password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let token = body["access_token"].as_str().unwrap().to_string();
        (app, token)
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }
}

fn multipart_png(boundary: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dependencies"]["storage"]["healthy"], true);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/departments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, _) = app
        .send("GET", "/api/departments", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_employee_cannot_create_department() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "Alice@Example.com",
                "password": "secret-password",
                "first_name": "Alice",
                "last_name": "Smith",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "EMPLOYEE");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "POST",
            "/api/departments",
            Some(&token),
            Some(json!({ "name": "Eng", "legal_entity_id": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);
    assert_eq!(body["kind"], "forbidden");

    // refresh tokens are not accepted as access tokens
    let (status, login) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "secret-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let refresh = login["refresh_token"].as_str().unwrap();
    let (status, _) = app.send("GET", "/api/auth/me", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cyclic_move_over_http() {
    let (app, token) = TestApp::with_admin().await;
    let token = Some(token.as_str());

    let (status, acme) = app
        .send("POST", "/api/legal-entities", token, Some(json!({ "name": "Acme" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{acme}");

    let (status, eng) = app
        .send(
            "POST",
            "/api/departments",
            token,
            Some(json!({ "name": "Eng", "legal_entity_id": acme["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{eng}");

    let (status, backend) = app
        .send(
            "POST",
            "/api/departments",
            token,
            Some(json!({
                "name": "Backend",
                "legal_entity_id": acme["id"],
                "parent_id": eng["id"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{backend}");

    let eng_uri = format!("/api/departments/{}", eng["id"].as_str().unwrap());
    let (status, body) = app
        .send("PATCH", &eng_uri, token, Some(json!({ "parent_id": backend["id"] })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4004);
    assert_eq!(body["kind"], "conflict");

    let (status, view) = app.send("GET", &eng_uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["department"]["parent_id"], Value::Null);
    assert_eq!(view["subdepartments"].as_array().map(Vec::len), Some(1));

    // explicit null detaches
    let backend_uri = format!("/api/departments/{}", backend["id"].as_str().unwrap());
    let (status, moved) = app
        .send("PATCH", &backend_uri, token, Some(json!({ "parent_id": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["parent_id"], Value::Null);
}

#[tokio::test]
async fn test_declared_oversized_body_is_rejected() {
    let app = TestApp::new();
    let oversized = app.config.max_upload_size + 1;
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/employees/{}/avatar/upload", uuid::Uuid::new_v4()))
        .header(header::CONTENT_LENGTH, oversized.to_string())
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
        .body(Body::from("--x--"))
        .unwrap();

    let (status, body) = app.call(request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], 7101);
}

#[tokio::test]
async fn test_avatar_upload_and_download_over_http() {
    let (app, token) = TestApp::with_admin().await;
    let (_, me) = app.send("GET", "/api/auth/me", Some(&token), None).await;
    let user_id = me["id"].as_str().unwrap().to_string();

    let image = [0x89, b'P', b'N', b'G', 1, 2, 3, 4];
    let boundary = "staffbook-boundary";
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/employees/{user_id}/avatar/upload?no_moderation=true"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_png(boundary, &image)))
        .unwrap();
    let (status, uploaded) = app.call(request).await;
    assert_eq!(status, StatusCode::OK, "{uploaded}");
    assert_eq!(uploaded["status"], "ACTIVE");

    let (_, me) = app.send("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(me["current_avatar_id"], uploaded["avatar_id"]);

    let key = uploaded["storage_key"].as_str().unwrap();
    let request = Request::builder()
        .uri(format!("/api/employees/avatars/files/{key}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &image[..]);

    // a body without the file field
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/employees/{user_id}/avatar/upload"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        )))
        .unwrap();
    let (status, body) = app.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7104);
}
