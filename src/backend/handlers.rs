// src/backend/handlers.rs
use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::AppState;
use crate::error::StoreError;
use crate::store::http::API_KEY_HEADER;
use crate::store::Document;

type ApiError = (StatusCode, String);

/// Check the shared api key on a document route.
///
/// This gates the server as a whole, not a single owner. The same key is
/// handed to every client by `/api/config`, and it opens the routes of every
/// owner path. Owner ids are trusted as sent, so this is only as private as
/// the network the server runs on.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = state.credentials.as_ref().map(|c| c.api_key.as_str()).ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "document store is not configured".to_string(),
    ))?;

    match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(given) if given == expected => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "missing or invalid api key".to_string())),
    }
}

fn store_error(e: StoreError) -> ApiError {
    tracing::error!("document store failure: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Relays the remote store credentials held in the server's environment.
pub async fn config_handler(State(state): State<AppState>) -> Response {
    match &state.credentials {
        Some(creds) => (StatusCode::OK, Json(creds.clone())).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Remote store environment variables are not set on the server."
            })),
        )
            .into_response(),
    }
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Document>>, ApiError> {
    authorize(&state, &headers)?;
    let docs = state.docs.list_items(&owner).await.map_err(store_error)?;
    Ok(Json(docs))
}

pub async fn put_item(
    State(state): State<AppState>,
    Path((owner, key)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.docs.put_item(&owner, &key, body).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((owner, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.docs.delete_item(&owner, &key).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Option<Value>>, ApiError> {
    authorize(&state, &headers)?;
    let config = state.docs.get_config(&owner).await.map_err(store_error)?;
    Ok(Json(config))
}

pub async fn replace_config(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.docs.put_config(&owner, body, false).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn merge_config(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.docs.put_config(&owner, body, true).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// Each delivery becomes one `snapshot` event; store failures become `error`
// events and the client decides whether to reconnect.
fn to_event<T: Serialize>(delivery: Result<T, StoreError>) -> Result<Event, Infallible> {
    let encoded = delivery
        .and_then(|value| serde_json::to_string(&value).map_err(StoreError::from));
    let event = match encoded {
        Ok(data) => Event::default().event("snapshot").data(data),
        Err(e) => {
            tracing::warn!("change feed error: {}", e);
            Event::default().event("error").data(e.to_string().replace('\r', ""))
        }
    };
    Ok(event)
}

fn sse<S>(stream: S) -> impl IntoResponse
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    (
        [("X-Accel-Buffering", "no"), ("Cache-Control", "no-cache")],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}

pub async fn watch_items(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    tracing::debug!(owner = %owner, "items feed opened");
    let feed = state.docs.watch_items(&owner).await;
    Ok(sse(StreamExt::map(feed, to_event)))
}

pub async fn watch_config(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    let feed = state.docs.watch_config(&owner).await;
    Ok(sse(StreamExt::map(feed, to_event)))
}
