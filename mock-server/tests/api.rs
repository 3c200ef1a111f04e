use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, MockState, DEFAULT_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn authed(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    authed("GET", uri, "")
}

// --- auth ---

#[tokio::test]
async fn missing_token_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/v1/about").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Unauthenticated.");
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/about")
                .header(http::header::AUTHORIZATION, "Bearer nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- about ---

#[tokio::test]
async fn about_reports_version() {
    let resp = app().oneshot(get("/api/v1/about")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["version"], "6.1.0");
}

// --- accounts ---

#[tokio::test]
async fn list_accounts_filters_by_type() {
    let resp = app().oneshot(get("/api/v1/accounts?type=asset")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["type"], "accounts");
    assert_eq!(data[0]["attributes"]["name"], "Checking");
    assert_eq!(data[0]["attributes"]["type"], "asset");
    assert_eq!(body["meta"]["pagination"]["total"], 2);
}

#[tokio::test]
async fn get_account_not_found() {
    let resp = app().oneshot(get("/api/v1/accounts/999")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

// --- transactions ---

#[tokio::test]
async fn list_transactions_with_splits() {
    let resp = app().oneshot(get("/api/v1/transactions?type=withdrawal")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let split = &body["data"][0]["attributes"]["transactions"][0];
    assert_eq!(split["amount"], "42.50");
    assert_eq!(split["type"], "withdrawal");
}

#[tokio::test]
async fn list_transactions_other_type_is_empty() {
    let resp = app().oneshot(get("/api/v1/transactions?type=deposit")).await.unwrap();
    let body = body_json(resp).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

// --- categories ---

#[tokio::test]
async fn create_category_returns_201() {
    let resp = app()
        .oneshot(authed("POST", "/api/v1/categories", r#"{"name":"Groceries"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["type"], "categories");
    assert_eq!(body["data"]["attributes"]["name"], "Groceries");
}

#[tokio::test]
async fn create_category_without_name_returns_422() {
    let resp = app()
        .oneshot(authed("POST", "/api/v1/categories", r#"{"notes":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
}

// --- lifecycle ---

#[tokio::test]
async fn duplicate_category_rejected() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("POST", "/api/v1/categories", r#"{"name":"Groceries"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // same name, different case
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("POST", "/api/v1/categories", r#"{"name":"groceries"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "The given data was invalid.");
    assert_eq!(body["errors"]["name"][0], "This name is already in use.");

    // get by id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/api/v1/categories/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["data"]["attributes"]["name"], "Groceries");

    // list holds exactly one
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/v1/categories"))
        .await
        .unwrap();
    let list = body_json(resp).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn categories_paginate() {
    let state = MockState::with_page_size(DEFAULT_TOKEN, 2);
    for name in ["A", "B", "C"] {
        let resp = app_with_state(state.clone())
            .oneshot(authed("POST", "/api/v1/categories", &format!(r#"{{"name":"{name}"}}"#)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app_with_state(state.clone())
        .oneshot(get("/api/v1/categories?page=2"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["attributes"]["name"], "C");
    assert_eq!(body["meta"]["pagination"]["current_page"], 2);
    assert_eq!(body["meta"]["pagination"]["total_pages"], 2);
}

#[tokio::test]
async fn budgets_create_and_fetch() {
    let state = MockState::new(DEFAULT_TOKEN);

    let resp = app_with_state(state.clone())
        .oneshot(authed("POST", "/api/v1/budgets", r#"{"name":"Food","notes":"monthly"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = app_with_state(state)
        .oneshot(get(&format!("/api/v1/budgets/{id}")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["attributes"]["notes"], "monthly");
}

// --- fault injection ---

#[tokio::test]
async fn injected_faults_precede_normal_service() {
    let state = MockState::new(DEFAULT_TOKEN);
    state.fail_next(1, 503);

    let resp = app_with_state(state.clone()).oneshot(get("/api/v1/about")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Service Unavailable");

    let resp = app_with_state(state.clone()).oneshot(get("/api/v1/about")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.hits(), 2);
}
