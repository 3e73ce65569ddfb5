//! WebSocket bridges from the in-process `ProgressBus` to task/book
//! subscribers. Both send an initial snapshot before switching to live
//! forwarding; the book-scoped socket additionally resolves which task is
//! currently relevant, since clients only know the book they're watching.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use poem::web::websocket::{Message, WebSocket};
use poem::web::{Data, Path};
use poem::{handler, IntoResponse};
use uuid::Uuid;

use crate::api::AppState;
use crate::catalog;
use crate::progress_bus::ProgressEvent;

#[handler]
pub fn task_progress_ws(Path(task_uuid): Path<Uuid>, ws: WebSocket, Data(state): Data<&Arc<AppState>>) -> impl IntoResponse {
    let state = Arc::clone(state);
    ws.on_upgrade(move |socket| async move {
        stream_task(socket, state, task_uuid).await;
    })
}

#[handler]
pub fn book_progress_ws(Path(book_uuid): Path<Uuid>, ws: WebSocket, Data(state): Data<&Arc<AppState>>) -> impl IntoResponse {
    let state = Arc::clone(state);
    ws.on_upgrade(move |socket| async move {
        stream_book(socket, state, book_uuid).await;
    })
}

async fn stream_task(socket: poem::web::websocket::WebSocketStream, state: Arc<AppState>, task_uuid: Uuid) {
    let (mut sink, mut stream) = socket.split();

    if let Ok(task) = catalog::task::get(&state.db, task_uuid).await {
        let snapshot = ProgressEvent::progress(
            task_uuid,
            &task.status,
            task.total,
            task.downloaded,
            task.failed,
            task.progress_percent(),
            task.error_message.clone(),
            None,
        );
        let _ = send_event(&mut sink, &snapshot).await;
    }

    let (sub_id, mut rx) = state.bus.subscribe(task_uuid);
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) if text.contains("\"ping\"") => {
                        let _ = sink.send(Message::Text(r#"{"type":"pong"}"#.to_string())).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
    state.bus.unsubscribe(task_uuid, sub_id);
}

async fn stream_book(socket: poem::web::websocket::WebSocketStream, state: Arc<AppState>, book_uuid: Uuid) {
    loop {
        match catalog::task::latest_active_for_book(&state.db, book_uuid).await {
            Ok(Some(task)) => {
                stream_task(socket, state, task.task_uuid).await;
                return;
            }
            _ => {
                let Ok(book) = catalog::book::get(&state.db, book_uuid).await else {
                    return;
                };
                if book.download_status != "downloading" {
                    return;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

async fn send_event(
    sink: &mut futures::stream::SplitSink<poem::web::websocket::WebSocketStream, Message>,
    event: &ProgressEvent,
) -> Result<(), ()> {
    let text = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(text)).await.map_err(|_| ())
}
