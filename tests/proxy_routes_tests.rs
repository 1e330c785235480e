//! API-proxy contract tests: validation, forwarding and error relay, driven
//! through the dashboard router against a recording mock coordinator.

mod support;

use axum::http::StatusCode;
use serde_json::json;

use support::{call, dead_address, enc, post_json, MockCoordinator};

#[tokio::test]
async fn every_route_rejects_missing_credentials() {
    let post_routes = [
        "/api/auth/verify",
        "/api/auth/change-password",
        "/api/tasks/submit",
        "/api/tasks/query",
        "/api/tasks/abc/cancel",
        "/api/tasks/abc/labels",
        "/api/tasks/abc/spec",
        "/api/tasks/abc/artifacts/upload",
        "/api/attachments/upload",
        "/api/attachments/download",
        "/api/attachments/query",
        "/api/attachments/delete",
        "/api/workers/query",
        "/api/workers/w1/tags",
        "/api/workers/w1/groups",
        "/api/groups/create",
        "/api/groups/g1/users",
        "/api/users/groups",
        "/api/admin/groups/g1/storage-quota",
        "/api/admin/users/create",
        "/api/admin/users/alice/password",
        "/api/admin/shutdown",
    ];
    for uri in post_routes {
        let (status, body) = post_json(uri, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "route {}", uri);
        let msg = body["error"].as_str().unwrap_or_default();
        assert!(msg.contains("token"), "route {} said {:?}", uri, body);
    }

    let query_routes = [
        ("GET", "/api/tasks/abc"),
        ("GET", "/api/tasks/abc/artifacts/result"),
        ("DELETE", "/api/tasks/abc/artifacts/result"),
        ("GET", "/api/workers/w1"),
        ("DELETE", "/api/workers/w1/cancel"),
        ("GET", "/api/groups/g1"),
        ("DELETE", "/api/groups/g1/users"),
        ("DELETE", "/api/admin/workers/w1/cancel"),
    ];
    for (method, uri) in query_routes {
        let (status, body) = call(method, &format!("{}?token=t", uri), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert!(body["error"].as_str().unwrap_or_default().contains("coordinator_addr"));
    }
}

#[tokio::test]
async fn login_requires_address_but_not_token() {
    let (status, body) = post_json("/api/auth/login", json!({"username": "u", "password": "p"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required parameter(s): coordinator_addr");

    let mock = MockCoordinator::default();
    let base = mock.start().await;
    mock.reply("POST", "/login", 200, r#"{"token":"tok-123"}"#);
    let (status, body) = post_json(
        "/api/auth/login",
        json!({"username": "u", "password": "p", "coordinator_addr": format!("{}/dashboard/", base), "retain": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], "tok-123");
    let rec = mock.last();
    assert_eq!(rec.path, "/login");
    assert_eq!(rec.authorization, None);
    assert_eq!(rec.json(), json!({"username": "u", "password": "p", "retain": true}));
}

#[tokio::test]
async fn forwards_bearer_and_strips_credentials() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;
    mock.reply("POST", "/tasks", 200, r#"{"task_id":7,"uuid":"u-7"}"#);

    let (status, body) = post_json(
        "/api/tasks/submit",
        json!({"token": "secret", "coordinator_addr": base, "group_name": "g", "task_spec": {"args": ["echo"]}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"task_id": 7, "uuid": "u-7"}));

    let rec = mock.last();
    assert_eq!(rec.method, "POST");
    assert_eq!(rec.authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(rec.json(), json!({"group_name": "g", "task_spec": {"args": ["echo"]}}));
}

#[tokio::test]
async fn relays_coordinator_failure_status_and_text() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;
    mock.reply("GET", "/tasks/missing", 404, "Task missing not found");

    let uri = format!("/api/tasks/missing?token=t&coordinator_addr={}", enc(&base));
    let (status, body) = call("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Task missing not found"}));
}

#[tokio::test]
async fn malformed_json_is_internal_error() {
    let (status, body) = call("POST", "/api/tasks/query", Some("{\"token\": ")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn unreachable_coordinator_is_internal_error() {
    let addr = dead_address().await;
    let (status, body) = post_json("/api/workers/query", json!({"token": "t", "coordinator_addr": addr})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn empty_success_body_becomes_empty_object() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;
    mock.reply("DELETE", "/tasks/abc/artifacts/exec-log", 200, "");

    let uri = format!("/api/tasks/abc/artifacts/exec-log?token=t&coordinator_addr={}", enc(&base));
    let (status, body) = call("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert_eq!(mock.last().method, "DELETE");
}

#[tokio::test]
async fn artifact_upload_mints_presigned_url() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;
    mock.reply("POST", "/tasks/abc/artifacts", 200, r#"{"url":"https://storage/x"}"#);

    let (status, body) = post_json(
        "/api/tasks/abc/artifacts/upload",
        json!({"token": "t", "coordinator_addr": base, "content_type": "result", "content_length": 1024}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://storage/x");
    assert_eq!(mock.last().json(), json!({"content_type": "result", "content_length": 1024}));

    let (status, body) = post_json(
        "/api/tasks/abc/artifacts/upload",
        json!({"token": "t", "coordinator_addr": base, "content_type": "result"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required parameter(s): content_length");
}

#[tokio::test]
async fn attachment_routes_build_group_paths() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;

    let (status, _) = post_json(
        "/api/attachments/upload",
        json!({"token": "t", "coordinator_addr": base, "group_name": "research", "key": "runs/a.tar", "content_length": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rec = mock.last();
    assert_eq!(rec.path, "/groups/research/attachments");
    assert_eq!(rec.json(), json!({"key": "runs/a.tar", "content_length": 5}));

    let (status, _) = post_json(
        "/api/attachments/download",
        json!({"token": "t", "coordinator_addr": base, "group_name": "research", "key": "runs/a.tar"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rec = mock.last();
    assert_eq!((rec.method.as_str(), rec.path.as_str()), ("GET", "/groups/research/download/attachments/runs/a.tar"));

    let (status, _) = post_json(
        "/api/attachments/delete",
        json!({"token": "t", "coordinator_addr": base, "group_name": "research", "key": "runs/a.tar"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rec = mock.last();
    assert_eq!((rec.method.as_str(), rec.path.as_str()), ("DELETE", "/groups/research/attachments/runs/a.tar"));
}

#[tokio::test]
async fn worker_cancel_passes_force_flag() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;

    let uri = format!("/api/admin/workers/w-9/cancel?token=t&coordinator_addr={}&force=true", enc(&base));
    let (status, _) = call("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let rec = mock.last();
    assert_eq!((rec.method.as_str(), rec.path.as_str()), ("DELETE", "/admin/workers/w-9"));
    assert_eq!(rec.query.as_deref(), Some("op=force"));

    let uri = format!("/api/workers/w-9/cancel?token=t&coordinator_addr={}", enc(&base));
    let (status, _) = call("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let rec = mock.last();
    assert_eq!(rec.path, "/workers/w-9");
    assert_eq!(rec.query, None);
}

#[tokio::test]
async fn storage_quota_and_group_user_removal() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;

    let (status, _) = post_json(
        "/api/admin/groups/research/storage-quota",
        json!({"token": "t", "coordinator_addr": base, "storage_quota": "50GiB"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rec = mock.last();
    assert_eq!((rec.method.as_str(), rec.path.as_str()), ("PUT", "/admin/groups/research/storage-quota"));
    assert_eq!(rec.json(), json!({"storage_quota": "50GiB"}));

    let uri = format!("/api/groups/research/users?token=t&coordinator_addr={}&users=alice,bob", enc(&base));
    let (status, _) = call("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let rec = mock.last();
    assert_eq!((rec.method.as_str(), rec.path.as_str()), ("DELETE", "/groups/research/users"));
    assert_eq!(rec.json(), json!({"users": ["alice", "bob"]}));
}

#[tokio::test]
async fn coordinator_conflict_is_relayed_on_shutdown() {
    let mock = MockCoordinator::default();
    let base = mock.start().await;
    mock.reply("POST", "/admin/shutdown", 403, "Invalid shutdown secret");

    let (status, body) = post_json("/api/admin/shutdown", json!({"token": "t", "coordinator_addr": base, "secret": "nope"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid shutdown secret");
    assert_eq!(mock.last().json(), json!({"secret": "nope"}));
}

#[tokio::test]
async fn admin_user_listing_is_sample_data() {
    let (status, body) = call("GET", "/api/admin/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["users"].as_array().map(|a| !a.is_empty()).unwrap_or(false));

    let (status, body) = call("GET", "/api/admin/users/groups", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["groups"].is_array());

    let (status, body) = call("GET", "/api/admin/users/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, body) = call("GET", "/api/admin/users/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User nobody not found");
}

#[tokio::test]
async fn undecodable_path_segment_is_json_bad_request() {
    let (status, body) = call("GET", "/api/tasks/%FF?token=t&coordinator_addr=http://c", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let msg = body["error"].as_str().unwrap_or_default();
    assert!(msg.starts_with("Invalid path parameter"), "body was {:?}", body);

    let (status, body) = call("GET", "/api/admin/users/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_endpoint() {
    let (status, body) = call("GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
