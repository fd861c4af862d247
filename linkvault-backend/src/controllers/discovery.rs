//! Well-known discovery document
//!
//! Served at /.well-known/agent.json so external orchestrators can discover
//! the agents, workflows, and endpoints this process exposes.

use actix_web::{web, HttpResponse, Responder};
use serde_json::{json, Value};

use crate::controllers::health::VERSION;
use crate::orchestrator::TaskOrchestrator;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/.well-known/agent.json").route(web::get().to(discovery_document)));
}

async fn discovery_document(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(build_document(&state.orchestrator))
}

/// Assemble the discovery document from live registry state.
pub fn build_document(orchestrator: &TaskOrchestrator) -> Value {
    json!({
        "name": "LinkVault",
        "version": VERSION,
        "description": "Bookmark processing pipeline with task orchestration",
        "agents": orchestrator.get_agent_capabilities(),
        "systemCapabilities": {
            "workflows": orchestrator.workflow_names(),
            "taskManagement": true,
            "artifactStorage": true,
            "realtimeUpdates": true,
            "authentication": ["bearer"],
            "protocols": ["a2a"]
        },
        "endpoints": {
            "tasks": "/api/tasks",
            "agents": "/api/agents",
            "discovery": "/.well-known/agent.json"
        }
    })
}
