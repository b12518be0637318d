//! The coordination core's only HTTP surface: operator-facing health and
//! stats endpoints. Everything client-facing lives on the WebSocket upgrade
//! in `crate::ws`; room/message CRUD HTTP APIs are out of scope (§1).

use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{State, catch, get};

use crate::hub::Hub;

#[get("/api/v1/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "roomcore",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/api/v1/stats")]
pub async fn stats(hub: &State<Arc<Hub>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "rooms": hub.room_count().await,
        "sessions": hub.session_count().await,
    }))
}

#[catch(404)]
pub fn not_found() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": "not found" }))
}
