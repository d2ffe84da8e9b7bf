//! Hub server core: REST task routes, the WebSocket fan-out endpoint, and
//! server startup.
//!
//! The hub is the durable side of a board. It validates and stores tasks,
//! answers owner-scoped listings, and forwards event frames between
//! connected clients. Frames are opaque here: the hub never decodes them,
//! so clients stay free to evolve the event vocabulary on their own.

use std::sync::Arc;

use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use syncboard_proto::api::{NewTask, NewUser, TaskUpdate};
use syncboard_proto::task::{OwnerId, Task, TaskId};

use crate::state::BoardState;

/// Query parameters of `GET /tasks`.
#[derive(Debug, serde::Deserialize)]
struct ListParams {
    uid: String,
}

/// `POST /users`: stores the authenticated profile.
async fn register_user(
    State(state): State<Arc<BoardState>>,
    Json(user): Json<NewUser>,
) -> StatusCode {
    tracing::info!(uid = %user.uid, "user registered");
    state.register_user(user).await;
    StatusCode::CREATED
}

/// `GET /tasks?uid=`: lists the owner's tasks in board order.
async fn list_tasks(
    State(state): State<Arc<BoardState>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Task>> {
    let owner = OwnerId::from(params.uid);
    Json(state.list_tasks(&owner).await)
}

/// `POST /tasks`: validates and stores a new task, returning the canonical
/// record with its assigned id and creation time.
async fn create_task(
    State(state): State<Arc<BoardState>>,
    Json(new): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    if let Err(e) = new.validate() {
        tracing::warn!(owner = %new.owner, error = %e, "rejecting task create");
        return Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }
    let task = state.insert_task(new).await;
    tracing::info!(task = %task.id, owner = %task.owner, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PUT /tasks/{id}`: wholesale-replaces the stored task.
async fn update_task(
    State(state): State<Arc<BoardState>>,
    Path(id): Path<TaskId>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<Task>, (StatusCode, String)> {
    if let Err(e) = update.validate() {
        tracing::warn!(task = %id, error = %e, "rejecting task update");
        return Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }
    match state.replace_task(&id, update).await {
        Some(task) => {
            tracing::debug!(task = %id, "task updated");
            Ok(Json(task))
        }
        None => Err((StatusCode::NOT_FOUND, format!("task {id} not found"))),
    }
}

/// `DELETE /tasks/{id}`: removes the stored task.
async fn delete_task(
    State(state): State<Arc<BoardState>>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.remove_task(&id).await {
        tracing::info!(task = %id, "task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("task {id} not found")))
    }
}

/// Handles an upgraded WebSocket connection for a single board client.
///
/// The connection lifecycle:
/// 1. Attach the client to the fan-out registry.
/// 2. Forward every inbound text frame, unchanged, to all other clients.
/// 3. On disconnect, detach the client.
pub async fn handle_socket(socket: WebSocket, state: Arc<BoardState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel feeding this client's WebSocket writer.
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let client_id = state.attach_client(tx).await;
    tracing::info!(client = client_id, "board client connected");

    // Writer task: forwards fanned-out frames from the channel to the socket.
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(client = client_id, "WebSocket write failed");
                break;
            }
        }
    });

    // Reader loop: each text frame fans out to every other client. Frames
    // are not decoded; a malformed frame is the receivers' problem.
    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!(client = client_id, len = text.len(), "fanning out frame");
                    reader_state.fan_out(client_id, &Message::Text(text)).await;
                }
                Message::Close(_) => {
                    tracing::info!(client = client_id, "received close frame");
                    break;
                }
                _ => {
                    // Ignore binary, ping, pong frames.
                }
            }
        }
    });

    // Wait for either task to finish, then abort the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.detach_client(client_id).await;
    tracing::info!(client = client_id, "board client disconnected");
}

/// Starts the hub server on the given address and returns the bound address
/// and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(BoardState::new())).await
}

/// Starts the hub server with a pre-built [`BoardState`].
///
/// Keeping a handle on the state lets embedders seed tasks or watch the
/// client registry; `main.rs` just passes a fresh one.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<BoardState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/users", axum::routing::post(register_user))
        .route("/tasks", axum::routing::get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            axum::routing::put(update_task).delete(delete_task),
        )
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "hub server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the hub server in-process for testing.
///
/// Binds to `127.0.0.1:0` (OS-assigned port) and returns the bound address
/// and a [`tokio::task::JoinHandle`] for cleanup.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    State(state): State<Arc<BoardState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
