//! The operator-facing HTTP surface: `/api/v1/health` and `/api/v1/stats`.
//! Everything client-facing is the WebSocket upgrade, covered in `pipeline.rs`
//! via the session layer directly rather than a real socket.

use rocket::http::Status;
use rocket::local::asynchronous::Client;

use super::common::{connect, test_server};

#[tokio::test]
async fn health_reports_ok() {
    let rocket = roomcore::build(":memory:", roomcore::config::Config::default()).await;
    let client = Client::tracked(rocket).await.expect("valid rocket instance");

    let response = client.get("/api/v1/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "roomcore");
}

#[tokio::test]
async fn unknown_route_reports_the_json_404_catcher() {
    let rocket = roomcore::build(":memory:", roomcore::config::Config::default()).await;
    let client = Client::tracked(rocket).await.expect("valid rocket instance");

    let response = client.get("/no-such-route").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn stats_counts_rooms_and_sessions() {
    let server = test_server();
    let (_a, _a_handle) = connect(&server, "r1", "u1", "alice").await;
    let (_b, _b_handle) = connect(&server, "r2", "u2", "bob").await;

    assert_eq!(server.hub.room_count().await, 2);
    assert_eq!(server.hub.session_count().await, 2);
}
