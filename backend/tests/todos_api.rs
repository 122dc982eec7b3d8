use std::path::PathBuf;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use backend::{
    app,
    config::{Config, StoreKind},
    state::AppState,
    store::MemoryStore,
};
use http_body_util::BodyExt;
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use tower::ServiceExt;

#[fixture]
fn todo_app() -> Router {
    let config = Config {
        port: 0,
        redis_url: String::new(),
        store: StoreKind::Memory,
        static_dir: PathBuf::from("does-not-exist"),
    };
    app(AppState::new(MemoryStore::new()), &config)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn list(app: &Router) -> Vec<Value> {
    let response = call(app, "GET", "/api/todos", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    match json_body(response).await {
        Value::Array(todos) => todos,
        other => panic!("Expected an array, got {other}"),
    }
}

#[rstest]
#[tokio::test]
async fn create_complete_delete_lifecycle(todo_app: Router) {
    let response = call(
        &todo_app,
        "POST",
        "/api/todos",
        Some(json!({ "text": "Buy milk", "priority": "High" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["completed"], false);
    assert_eq!(created["notes"], "");
    assert_eq!(created["priority"], "High");
    assert_eq!(created["dueDate"], Value::Null);
    let uri = format!("/api/todos/{}", created["id"].as_str().unwrap());

    let response = call(&todo_app, "PUT", &uri, Some(json!({ "completed": true }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["completed"], true);
    for field in ["id", "text", "notes", "priority", "dueDate", "createdAt"] {
        assert_eq!(updated[field], created[field], "{field} changed");
    }

    let listed = list(&todo_app).await;
    assert_eq!(listed, vec![updated]);

    let response = call(&todo_app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.into_body().collect().await.unwrap().to_bytes().is_empty());

    assert!(list(&todo_app).await.is_empty());
}

#[rstest]
#[tokio::test]
async fn list_is_newest_first(todo_app: Router) {
    for text in ["first", "second", "third"] {
        let response = call(&todo_app, "POST", "/api/todos", Some(json!({ "text": text }))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let texts: Vec<Value> = list(&todo_app).await.into_iter().map(|t| t["text"].clone()).collect();
    assert_eq!(texts, [json!("third"), json!("second"), json!("first")]);
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "text": "" }))]
#[case(json!({ "text": "a".repeat(101) }))]
#[case(json!({ "text": "a", "notes": "n".repeat(401) }))]
#[case(json!({ "text": "a", "priority": "Urgent" }))]
#[tokio::test]
async fn invalid_create_persists_nothing(todo_app: Router, #[case] payload: Value) {
    let response = call(&todo_app, "POST", "/api/todos", Some(payload)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Validation failed");
    assert!(list(&todo_app).await.is_empty());
}

#[rstest]
#[tokio::test]
async fn empty_update_is_rejected(todo_app: Router) {
    let created = json_body(
        call(&todo_app, "POST", "/api/todos", Some(json!({ "text": "a" }))).await,
    )
    .await;
    let uri = format!("/api/todos/{}", created["id"].as_str().unwrap());

    let response = call(&todo_app, "PUT", &uri, Some(json!({}))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["details"],
        "\"value\" must have at least 1 key"
    );
}

#[rstest]
#[case(json!(null))]
#[case(json!(""))]
#[tokio::test]
async fn clearing_due_date_stores_null(todo_app: Router, #[case] due_date: Value) {
    let created = json_body(
        call(
            &todo_app,
            "POST",
            "/api/todos",
            Some(json!({ "text": "a", "dueDate": "2030-01-01T10:00:00.000Z" })),
        )
        .await,
    )
    .await;
    assert_eq!(created["dueDate"], "2030-01-01T10:00:00Z");
    let uri = format!("/api/todos/{}", created["id"].as_str().unwrap());

    let response = call(&todo_app, "PUT", &uri, Some(json!({ "dueDate": due_date }))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["dueDate"], Value::Null);
}

#[rstest]
#[tokio::test]
async fn not_found_leaves_collection_unchanged(todo_app: Router) {
    call(&todo_app, "POST", "/api/todos", Some(json!({ "text": "stay" }))).await;
    let uri = format!("/api/todos/{}", uuid::Uuid::new_v4());

    let response = call(&todo_app, "PUT", &uri, Some(json!({ "completed": true }))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = call(&todo_app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let listed = list(&todo_app).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["completed"], false);
}
