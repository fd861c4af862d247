//! Per-task WebSocket stream handler
//!
//! A subscriber gets a `connected` event, one snapshot of the task, then
//! live events for that task only. The server closes the stream after
//! forwarding a terminal `task.completed`/`task.failed` event. A client
//! disconnect drops the broadcast receiver, which is the subscription
//! cleanup.

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures_util::StreamExt;
use tokio::sync::broadcast::error::RecvError;

use crate::error::OrchestratorError;
use crate::gateway::protocol::GatewayEvent;
use crate::AppState;

pub async fn task_stream(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let task_id = path.into_inner();

    let task = match state.orchestrator.get_task(&task_id) {
        Ok(task) => task,
        Err(OrchestratorError::NotFound(_)) => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": format!("Task '{}' not found", task_id)
            })));
        }
        Err(e) => {
            log::error!("Failed to load task {} for streaming: {}", task_id, e);
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Internal server error"
            })));
        }
    };

    // Subscribe before the snapshot so no event between snapshot and loop
    // start is missed.
    let mut events = state.broadcaster.subscribe();
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    actix_web::rt::spawn(async move {
        for event in [GatewayEvent::connected(&task_id), GatewayEvent::snapshot(&task)] {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if session.text(text).await.is_err() {
                return;
            }
        }

        // Already-terminal tasks get their snapshot and an immediate close.
        if task.status.is_terminal() {
            let _ = session.close(None).await;
            return;
        }

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) if event.task_id() == Some(task_id.as_str()) => {
                            let terminal = event.is_terminal();
                            match serde_json::to_string(&event) {
                                Ok(text) => {
                                    if session.text(text).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    log::warn!("Failed to serialize gateway event: {}", e);
                                }
                            }
                            if terminal {
                                let _ = session.close(None).await;
                                break;
                            }
                        }
                        Ok(_) => {} // another task's event
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!(
                                "Stream for task {} lagged, skipped {} events",
                                task_id, skipped
                            );
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                msg = msg_stream.next() => {
                    match msg {
                        Some(Ok(Message::Ping(bytes))) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {} // ignore client text/binary
                        Some(Err(_)) => break,
                    }
                }
            }
        }
    });

    Ok(response)
}
