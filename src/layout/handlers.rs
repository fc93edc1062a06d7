//! Route handlers for saving and loading dashboard layouts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::AuthUser,
    layout::store::{Layouts, get_layouts, save_layouts},
};

/// The state needed to save and load layouts.
#[derive(Debug, Clone)]
pub struct LayoutState {
    /// The database connection for managing layouts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LayoutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The stored layouts of a user.
#[derive(Debug, Serialize)]
pub struct LayoutsResponse {
    layouts: Layouts,
}

/// A route handler for saving the authenticated user's dashboard layouts.
///
/// The body must be an object with a `layouts` object that maps screen sizes to
/// layout arrays. Nothing is saved if any layout is not an array.
pub async fn save_layout_endpoint(
    State(state): State<LayoutState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(body) = body?;

    let Some(layouts) = body.get("layouts").and_then(Value::as_object) else {
        return Err(Error::Validation(
            "layouts must be an object mapping screen sizes to layouts".to_owned(),
        ));
    };

    if let Some((screen_size, _)) = layouts.iter().find(|(_, layout)| !layout.is_array()) {
        return Err(Error::Validation(format!(
            "the layout for screen size \"{screen_size}\" must be an array"
        )));
    }

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    save_layouts(user.user_id, layouts, &connection)?;

    Ok(Json(json!({ "message": "Layout saved successfully" })))
}

/// A route handler for getting the authenticated user's dashboard layouts.
pub async fn get_layout_endpoint(
    State(state): State<LayoutState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LayoutsResponse>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let layouts = get_layouts(user.user_id, &connection)?;

    Ok(Json(LayoutsResponse { layouts }))
}
