//! Agent discovery endpoints

use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/agents").route(web::get().to(list_agents)));
}

async fn list_agents(state: web::Data<AppState>) -> impl Responder {
    let agents = state.orchestrator.get_agent_capabilities();
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": agents.len(),
        "agents": agents
    }))
}
