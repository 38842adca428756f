//! Info Route
//!
//! GET / - static informational route confirming the relay is running.

use axum::Json;

use crate::api::dto::InfoResponse;

/// GET /
pub async fn server_info() -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Hearsay relay server is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
