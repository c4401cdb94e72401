use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use blockform::adapters::any_block::AnyBlock;
use blockform::adapters::block_registry::BlockRegistry;
use blockform::adapters::field_block::{CharBlock, IntegerBlock};
use blockform::adapters::list_block::{ListBlock, ListBlockOptions};
use blockform::adapters::renderer::TeraRenderer;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn create_test_app() -> Router {
    let mut registry = BlockRegistry::new();
    registry.register("title", CharBlock::new().max_length(20));
    registry.register(
        "tags",
        ListBlock::with_options(
            AnyBlock::from(CharBlock::new().max_length(10)),
            ListBlockOptions {
                min_length: Some(1),
                max_length: Some(3),
                label: Some("Tags".to_string()),
                ..Default::default()
            },
        ),
    );
    registry.register("scores", ListBlock::new(AnyBlock::from(IntegerBlock::new())));

    let renderer = TeraRenderer::new().unwrap();
    blockform::create_app(Arc::new(registry), Arc::new(renderer))
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["blocks"], 3);
}

#[tokio::test]
async fn test_list_blocks() {
    let app = create_test_app();

    let request = Request::builder().uri("/blocks").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    let blocks = body["data"].as_array().unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1]["name"], "tags");
    assert_eq!(blocks[1]["label"], "Tags");
    assert!(blocks[1]["initializer"]
        .as_str()
        .unwrap()
        .starts_with("ListBlock({"));
    assert!(blocks[0].get("initializer").is_none());
}

#[tokio::test]
async fn test_get_form_renders_default_and_new_item_template() {
    let app = create_test_app();

    let request = Request::builder()
        .uri("/blocks/tags/form")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"name="tags-count""#));
    assert!(html.contains(r#"name="tags-0-value""#));
    assert!(html.contains("-newmember"));
    assert!(html.contains("__PREFIX__-value"));
}

#[tokio::test]
async fn test_submit_valid_list_returns_ordered_raw_value() {
    let app = create_test_app();

    let body = "tags-count=3\
        &tags-0-deleted=&tags-0-order=1&tags-0-value=rust\
        &tags-1-deleted=1&tags-1-order=0&tags-1-value=gone\
        &tags-2-deleted=&tags-2-order=0&tags-2-value=%20web%20";
    let response = app.oneshot(form_request("/blocks/tags", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["value"], json!(["web", "rust"]));
}

#[tokio::test]
async fn test_submit_invalid_list_rerenders_errors() {
    let app = create_test_app();

    let body = "tags-count=2\
        &tags-0-deleted=&tags-0-order=0&tags-0-value=fine\
        &tags-1-deleted=&tags-1-order=1&tags-1-value=";
    let response = app.oneshot(form_request("/blocks/tags", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_string(response).await;
    assert!(html.contains("This field is required."));
    assert!(html.contains(r#"value="fine""#));
    assert!(html.contains(r#"name="tags-1-value""#));
}

#[tokio::test]
async fn test_submit_too_few_items_reports_list_error() {
    let app = create_test_app();

    let response = app
        .oneshot(form_request("/blocks/tags", "tags-count=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_string(response).await;
    assert!(html.contains("Minimum of 1 is required"));
}

#[tokio::test]
async fn test_submit_without_count_is_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(form_request("/blocks/tags", "tags-0-order=0&tags-0-value=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_huge_count_is_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(form_request("/blocks/tags", "tags-count=1000000000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("tags-0-order"));
}

#[tokio::test]
async fn test_submit_malformed_order_is_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(form_request(
            "/blocks/scores",
            "scores-count=1&scores-0-order=up&scores-0-value=3",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("scores-0-order"));
}

#[tokio::test]
async fn test_unknown_block() {
    let app = create_test_app();

    let response = app
        .oneshot(form_request("/blocks/nope", "nope-count=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_content() {
    let app = create_test_app();

    let request = Request::builder()
        .uri("/blocks/tags/search")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(json!(["a", "b", "c"]).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["data"]["content"], json!(["a", "b", "c"]));

    let request = Request::builder()
        .uri("/blocks/tags/search")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "not": "a list" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
