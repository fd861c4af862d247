use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod agents;
mod config;
mod controllers;
mod db;
mod error;
mod gateway;
mod models;
mod orchestrator;

use agents::AgentRegistry;
use config::Config;
use db::Database;
use gateway::EventBroadcaster;
use orchestrator::TaskOrchestrator;

pub struct AppState {
    pub orchestrator: Arc<TaskOrchestrator>,
    pub broadcaster: Arc<EventBroadcaster>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    log::info!("Initializing event broadcaster");
    let broadcaster = Arc::new(EventBroadcaster::new());

    log::info!("Initializing agent registry");
    let registry = Arc::new(AgentRegistry::new());

    log::info!("Initializing task orchestrator");
    let orchestrator = TaskOrchestrator::new(db.clone(), registry, broadcaster.clone());

    let agent_count = agents::register_default_agents(&orchestrator, db.clone())
        .expect("Failed to register built-in agents");
    log::info!("Registered {} agents", agent_count);
    log::info!(
        "Workflows available: {}",
        orchestrator.workflow_names().join(", ")
    );

    log::info!("Starting LinkVault server on port {}", port);
    log::info!("Task streams available at /api/tasks/{{id}}/stream");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                orchestrator: Arc::clone(&orchestrator),
                broadcaster: Arc::clone(&broadcaster),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::tasks::config)
            .configure(controllers::agents::config)
            .configure(controllers::discovery::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
