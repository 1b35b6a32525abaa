use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use detour_core::content::{AttributeSchema, SchemaInfo};
use detour_core::{ContentTypeRegistry, ContentTypeSchema};
use detour_engine::TrackerConfig;
use detour_gateway::App;
use detour_storage::{MySqlContentRepository, MySqlRedirectStore, MySqlSettings};
use detour_test_infra::mysql::{MySqlServer, MysqlConfig};
use serde_json::{json, Value};
use sqlx::MySqlPool;
use tower::ServiceExt;

const ARTICLE: &str = "/api/content/api::article.article";

fn registry() -> ContentTypeRegistry {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "slug".to_string(),
        AttributeSchema {
            kind: "uid".to_string(),
        },
    );
    ContentTypeRegistry::from_schemas([ContentTypeSchema {
        uid: "api::article.article".to_string(),
        info: SchemaInfo {
            display_name: Some("Article".to_string()),
            plural_name: Some("articles".to_string()),
        },
        attributes,
    }])
    .unwrap()
}

/// Builds a gateway the way the binary does for the mysql backend.
async fn boot(pool: &MySqlPool) -> Router {
    let store = MySqlRedirectStore::new(pool.clone());
    store.ensure_schema().await.unwrap();
    let content = MySqlContentRepository::new(pool.clone());
    content.ensure_schema().await.unwrap();
    let settings = MySqlSettings::new(pool.clone());
    settings.ensure_schema().await.unwrap();

    let state = App::state(
        Arc::new(registry()),
        Arc::new(store),
        Arc::new(content),
        Arc::new(settings),
        TrackerConfig::default(),
    );
    App::router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn put_slug(app: &Router, id: u64, slug: &str) {
    let (status, body) = send(
        app,
        "PUT",
        &format!("{ARTICLE}/{id}"),
        Some(json!({ "data": { "slug": slug } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn live_redirects_survive_a_restart_and_an_unrelated_delete() {
    let mysql = MySqlServer::new(MysqlConfig::builder().build())
        .await
        .expect("start mysql");
    let pool = mysql.pool().await.expect("connect mysql");

    let before = boot(&pool).await;
    put_slug(&before, 1, "draft-one").await;
    put_slug(&before, 1, "live-one").await;
    put_slug(&before, 2, "draft-two").await;
    put_slug(&before, 2, "live-two").await;
    drop(before);

    let after = boot(&pool).await;
    put_slug(&after, 99, "unrelated").await;
    let (status, _) = send(&after, "DELETE", &format!("{ARTICLE}/99"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, active) = send(&after, "GET", "/api/redirects/active", None).await;
    assert_eq!(
        active,
        json!({ "data": [
            { "fromPath": "/articles/draft-one", "toPath": "/articles/live-one", "statusCode": 301 },
            { "fromPath": "/articles/draft-two", "toPath": "/articles/live-two", "statusCode": 301 },
        ]})
    );

    let (status, body) = send(&after, "GET", &format!("{ARTICLE}/1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "live-one");
}
