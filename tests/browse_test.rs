mod common;

use axum::http::{StatusCode, header};
use common::*;

#[tokio::test]
async fn test_root_listing_sorted_folders_first() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(&app, &mut cookies, get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;

    let order: Vec<usize> = ["archive", "Photos", "Budget.xlsx", "notes.txt"]
        .iter()
        .map(|name| html.find(&format!("data-name=\"{}\"", name)).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));

    assert!(html.contains("href=\"/browse/Photos\""));
    assert!(html.contains("href=\"/download?file=%2Fnotes%2Etxt\""));
    assert!(html.contains("<span class=\"current\">Home</span>"));
}

#[tokio::test]
async fn test_nested_folder_breadcrumbs_and_escaping() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(&app, &mut cookies, get("/browse/Photos")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<a href=\"/\">Home</a>"));
    assert!(html.contains("<span class=\"current\">Photos</span>"));
    assert!(html.contains("data-name=\"beach &amp; sun.jpg\""));

    let response = send(&app, &mut cookies, get("/browse/Photos/2024%20trip")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<a href=\"/browse/Photos\">Photos</a>"));
    assert!(html.contains("<span class=\"current\">2024 trip</span>"));
    assert!(html.contains("This folder is empty"));
}

#[tokio::test]
async fn test_missing_folder_is_not_found() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(&app, &mut cookies, get("/browse/nowhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notification_is_shown_once() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(
        &app,
        &mut cookies,
        post_json(
            "/api/folders",
            serde_json::json!({ "parent": "/", "name": "Reports" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookies.contains("notification"));

    let html = body_string(send(&app, &mut cookies, get("/")).await).await;
    assert!(html.contains("Created folder: Reports"));
    assert!(!cookies.contains("notification"));

    let html = body_string(send(&app, &mut cookies, get("/")).await).await;
    assert!(!html.contains("Created folder: Reports"));
}

#[tokio::test]
async fn test_api_listing() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(&app, &mut cookies, get("/api/entries?path=/Photos")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["path"], "/Photos");
    assert_eq!(body["breadcrumbs"][0]["link"], "/");
    assert!(body["breadcrumbs"][1]["link"].is_null());
    assert_eq!(body["entries"][0]["name"], "beach & sun.jpg");
    assert_eq!(body["entries"][0]["is_folder"], false);
    assert_eq!(body["entries"][0]["size"], 4096);
    assert_eq!(
        body["entries"][0]["link"],
        "/download?file=%2FPhotos%2Fbeach%20%26%20sun%2Ejpg"
    );
}

#[tokio::test]
async fn test_api_requires_session() {
    let (app, _storage) = setup_app();
    let mut cookies = Cookies::default();

    let response = send(&app, &mut cookies, get("/api/entries")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not signed in");

    let response = send(&app, &mut cookies, get("/download?file=/notes.txt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_download_streams_with_headers() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(
        &app,
        &mut cookies,
        get("/download?file=%2FPhotos%2Fbeach%20%26%20sun%2Ejpg"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_LENGTH], "11");
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"beach & sun.jpg\""));
    assert!(disposition.contains("filename*=UTF-8''beach%20%26%20sun%2Ejpg"));

    assert_eq!(body_string(response).await, "hello world");
}

#[tokio::test]
async fn test_download_missing_file() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(&app, &mut cookies, get("/download?file=/nope.txt")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, &mut cookies, get("/download?file=/")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_static_assets() {
    let (app, _storage) = setup_app();
    let mut cookies = Cookies::default();

    let response = send(&app, &mut cookies, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tracked_jobs"], 0);

    let response = send(&app, &mut cookies, get("/public/script.js")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_download_without_file_parameter() {
    let (app, _storage) = setup_app();
    let mut cookies = login(&app).await;

    let response = send(&app, &mut cookies, get("/download")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("file"));
}
