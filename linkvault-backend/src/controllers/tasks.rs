//! Task API endpoints
//!
//! Thin glue over the orchestrator: create, read, artifacts, messages,
//! stats, and the per-task live stream.

use actix_web::{web, HttpResponse, Responder};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::OrchestratorError;
use crate::gateway;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tasks")
            .route("", web::post().to(create_task))
            .route("/stats", web::get().to(get_stats))
            .route("/{id}", web::get().to(get_task))
            .route("/{id}/artifacts", web::get().to(list_artifacts))
            .route("/{id}/messages", web::get().to(list_messages))
            .route("/{id}/stream", web::get().to(gateway::actix_ws::task_stream)),
    );
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    workflow: String,
    #[serde(default)]
    context: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesParams {
    /// RFC3339 timestamp; only messages strictly after it are returned.
    since: Option<String>,
}

async fn create_task(
    state: web::Data<AppState>,
    body: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let body = body.into_inner();
    match state.orchestrator.create_task(&body.workflow, body.context) {
        Ok(task) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "taskId": task.id,
            "type": task.task_type,
            "status": task.status,
            "workflow": task.workflow
        })),
        Err(OrchestratorError::UnknownWorkflow(name)) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Unknown workflow '{}'", name)
            }))
        }
        Err(e) => {
            log::error!("Failed to create task: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Internal server error"
            }))
        }
    }
}

async fn get_task(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let task_id = path.into_inner();
    match state.orchestrator.get_task(&task_id) {
        Ok(task) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "task": task
        })),
        Err(OrchestratorError::NotFound(_)) => not_found(&task_id),
        Err(e) => internal_error("load task", &e),
    }
}

async fn list_artifacts(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let task_id = path.into_inner();
    match state.orchestrator.list_artifacts(&task_id) {
        Ok(artifacts) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": artifacts.len(),
            "artifacts": artifacts
        })),
        Err(OrchestratorError::NotFound(_)) => not_found(&task_id),
        Err(e) => internal_error("list artifacts", &e),
    }
}

async fn list_messages(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListMessagesParams>,
) -> impl Responder {
    let task_id = path.into_inner();

    let since = match &query.since {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&chrono::Utc)),
            Err(_) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": "Invalid 'since' timestamp, expected RFC3339"
                }));
            }
        },
        None => None,
    };

    match state.orchestrator.list_messages(&task_id, since) {
        Ok(messages) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": messages.len(),
            "messages": messages
        })),
        Err(OrchestratorError::NotFound(_)) => not_found(&task_id),
        Err(e) => internal_error("list messages", &e),
    }
}

async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    match state.orchestrator.get_task_stats() {
        Ok(stats) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "stats": stats
        })),
        Err(e) => internal_error("load task stats", &e),
    }
}

fn not_found(task_id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "success": false,
        "error": format!("Task '{}' not found", task_id)
    }))
}

fn internal_error(action: &str, error: &OrchestratorError) -> HttpResponse {
    log::error!("Failed to {}: {}", action, error);
    HttpResponse::InternalServerError().json(serde_json::json!({
        "success": false,
        "error": "Internal server error"
    }))
}
