//! Ingredient endpoints, which share the tag surface and semantics.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn ingredients_require_authentication() {
    let app = spawn_app().await;

    let (status, _) = app.request(Method::GET, "/ingredients/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_list_and_rename_ingredients() {
    let app = spawn_app().await;
    let token = app.signup("pantry@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/ingredients/",
            Some(&token),
            Some(json!({"name": "Salt"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().expect("id");

    app.request(
        Method::POST,
        "/ingredients/",
        Some(&token),
        Some(json!({"name": "Basil"})),
    )
    .await;

    let (_, body) = app.request(Method::GET, "/ingredients/", Some(&token), None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("ingredients")
        .iter()
        .map(|i| i["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Basil", "Salt"]);

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/ingredients/{}/", id),
            Some(&token),
            Some(json!({"name": "Sea salt"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Sea salt");
}

#[tokio::test]
async fn duplicate_ingredient_rejected_per_owner() {
    let app = spawn_app().await;
    let token = app.signup("dup-ing@example.com").await;

    app.request(
        Method::POST,
        "/ingredients/",
        Some(&token),
        Some(json!({"name": "Flour"})),
    )
    .await;

    let (status, body) = app
        .request(
            Method::POST,
            "/ingredients/",
            Some(&token),
            Some(json!({"name": "Flour"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["name"].is_string());
}

#[tokio::test]
async fn nested_ingredients_resolved_on_recipe_create() {
    let app = spawn_app().await;
    let token = app.signup("nested-ing@example.com").await;

    app.create_recipe(
        &token,
        json!({"title": "Soup", "time_minutes": 40, "price": "3.00",
               "ingredients": [{"name": "Carrot"}, {"name": "Onion"}]}),
    )
    .await;
    app.create_recipe(
        &token,
        json!({"title": "Stew", "time_minutes": 90, "price": "8.00",
               "ingredients": [{"name": "Onion"}]}),
    )
    .await;

    // "Onion" is reused, not duplicated.
    let (_, body) = app.request(Method::GET, "/ingredients/", Some(&token), None).await;
    assert_eq!(body["data"].as_array().expect("ingredients").len(), 2);
}

#[tokio::test]
async fn assigned_only_filters_unused_ingredients() {
    let app = spawn_app().await;
    let token = app.signup("assigned-ing@example.com").await;

    app.create_recipe(
        &token,
        json!({"title": "Omelette", "time_minutes": 5, "price": "1.50",
               "ingredients": [{"name": "Eggs"}]}),
    )
    .await;
    app.request(
        Method::POST,
        "/ingredients/",
        Some(&token),
        Some(json!({"name": "Truffle"})),
    )
    .await;

    let (status, body) = app
        .request(Method::GET, "/ingredients/?assigned_only=1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("ingredients")
        .iter()
        .map(|i| i["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Eggs"]);
}

#[tokio::test]
async fn cross_owner_ingredient_access_is_not_found() {
    let app = spawn_app().await;
    let alice = app.signup("cross-a@example.com").await;
    let bob = app.signup("cross-b@example.com").await;

    let (_, body) = app
        .request(
            Method::POST,
            "/ingredients/",
            Some(&alice),
            Some(json!({"name": "Saffron"})),
        )
        .await;
    let id = body["data"]["id"].as_i64().expect("id");

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/ingredients/{}/", id),
            Some(&bob),
            Some(json!({"name": "Paprika"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/ingredients/{}/", id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.request(Method::GET, "/ingredients/", Some(&bob), None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn delete_ingredient_returns_no_content() {
    let app = spawn_app().await;
    let token = app.signup("del-ing@example.com").await;

    let (_, body) = app
        .request(
            Method::POST,
            "/ingredients/",
            Some(&token),
            Some(json!({"name": "Parsley"})),
        )
        .await;
    let id = body["data"]["id"].as_i64().expect("id");

    let (status, _) = app
        .request(Method::DELETE, &format!("/ingredients/{}/", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.request(Method::GET, "/ingredients/", Some(&token), None).await;
    assert_eq!(body["data"], json!([]));
}
