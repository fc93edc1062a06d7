//! A public endpoint for checking that the server is up.

use axum::Json;
use serde_json::{Value, json};

/// A route handler that reports the server is running.
pub async fn get_health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Finfly API is running",
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        endpoints,
        test_utils::{get_test_app_state, get_test_server},
    };

    #[tokio::test]
    async fn health_does_not_need_token() {
        let server = get_test_server(get_test_app_state());

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "OK", "message": "Finfly API is running" }));
    }
}
