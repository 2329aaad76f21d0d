use axum::{
    Router,
    extract::{
        Json, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use common::{LogQuery, LogRecord, NewLog, PushEnvelope};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

pub mod config;
mod in_memory_store;

pub use in_memory_store::InMemoryStore;

use config::Config;

/// Header carrying the shared secret for `DELETE /api/logs`.
pub const DELETE_TOKEN_HEADER: &str = "x-delete-token";

const EVENT_BUFFER: usize = 256;

#[axum::async_trait]
pub trait LogStore: Send + Sync {
    /// Newest first, narrowed by `query`; paged when `page` or `limit` is set.
    async fn list_logs(
        &self,
        query: &LogQuery,
        default_limit: u32,
    ) -> anyhow::Result<Vec<LogRecord>>;
    async fn add_log(&self, new: NewLog) -> anyhow::Result<LogRecord>;
    /// Removes every log, returning how many were dropped.
    async fn clear(&self) -> anyhow::Result<usize>;
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn LogStore>,
    pub cfg: Config,
    pub events: broadcast::Sender<LogRecord>,
}

impl AppState {
    pub fn new(db: impl LogStore + 'static, cfg: Config) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            db: Arc::new(db),
            cfg,
            events,
        }
    }
}

pub fn app_builder(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/logs",
            get(list_logs).post(create_log).delete(delete_logs),
        )
        .route("/ws", get(live_socket))
        .with_state(state)
}

async fn list_logs(State(state): State<AppState>, Query(query): Query<LogQuery>) -> Response {
    match state.db.list_logs(&query, state.cfg.default_limit).await {
        Ok(list) => Json(list).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn create_log(State(state): State<AppState>, Json(payload): Json<NewLog>) -> Response {
    match state.db.add_log(payload).await {
        Ok(entry) => {
            // No subscribers is not an error.
            let _ = state.events.send(entry.clone());
            (StatusCode::CREATED, Json(entry)).into_response()
        }
        Err(err) => internal_error(err),
    }
}

async fn delete_logs(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(expected) = state.cfg.delete_token.as_deref() {
        let presented = headers
            .get(DELETE_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            tracing::warn!("rejected delete with missing or wrong token");
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "invalid delete token" })),
            )
                .into_response();
        }
    }

    match state.db.clear().await {
        Ok(deleted) => {
            tracing::info!(deleted, "logs cleared");
            Json(json!({ "deleted": deleted })).into_response()
        }
        Err(err) => internal_error(err),
    }
}

async fn live_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before the upgrade completes so nothing created after the
    // handshake is missed.
    let events = state.events.subscribe();
    ws.on_upgrade(move |socket| push_new_logs(socket, events))
}

async fn push_new_logs(mut socket: WebSocket, mut events: broadcast::Receiver<LogRecord>) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(record) => {
                    let frame = match PushEnvelope::new_log(&record)
                        .and_then(|envelope| serde_json::to_string(&envelope))
                    {
                        Ok(frame) => frame,
                        Err(err) => {
                            tracing::error!("failed to encode push frame: {err}");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "push subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::debug!("push subscriber disconnected");
}

fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!("log store failure: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
        .into_response()
}
