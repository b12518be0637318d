pub mod ai;
pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod hub;
pub mod models;
pub mod room;
pub mod routes;
pub mod session;
pub mod store;
pub mod topics;
pub mod ws;

use std::env;
use std::path::Path;
use std::sync::Arc;

use ai::Manager as AiManager;
use ai::provider::{LmStudioProvider, MockProvider, Provider};
use bus::EventBus;
use bus::local::LocalBus;
use bus::nats::NatsBus;
use config::Config;
use hub::Hub;
use store::{SqliteStore, Store};
use topics::TopicFormatter;

/// Builds the production `Rocket` instance: `Config::from_env()`, a SQLite
/// store at `DATABASE_PATH` (default `data/chat.db`), and a NATS-backed bus if
/// `ROOMCORE_NATS_URL` is set (falling back to the in-process bus otherwise).
pub async fn rocket() -> rocket::Rocket<rocket::Build> {
    let config = Config::from_env();
    let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "data/chat.db".to_string());
    build(&db_path, config).await
}

/// Same wiring as [`rocket`], with an explicit store path and config — the
/// seam tests use to get an isolated, on-disk (or `:memory:`) store per run.
pub async fn build(db_path: &str, config: Config) -> rocket::Rocket<rocket::Build> {
    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(db_path).expect("failed to open sqlite store"));
    let bus = connect_bus().await;
    let topics = TopicFormatter::new(config.topic_prefix.clone());
    let provider = select_provider();

    let ai = Arc::new(AiManager::new(store.clone(), bus.clone(), topics.clone(), config.clone(), provider));
    let hub = Arc::new(Hub::new(store.clone(), bus.clone(), topics.clone(), config.clone(), ai));
    let shutdown_hub = hub.clone();

    rocket::build()
        .manage(hub)
        .manage(bus)
        .manage(store)
        .manage(topics)
        .manage(config)
        .register("/", rocket::catchers![routes::not_found])
        .mount("/", rocket::routes![routes::health, routes::stats, ws::connect])
        .attach(rocket::fairing::AdHoc::on_shutdown("Coordination Core Shutdown Drain", move |_rocket| {
            Box::pin(async move {
                shutdown_hub.close().await;
                println!("roomcore: hub drained, every session's outbound queue closed");
            })
        }))
}

async fn connect_bus() -> Arc<dyn EventBus> {
    match env::var("ROOMCORE_NATS_URL") {
        Ok(url) => match NatsBus::connect(&url).await {
            Ok(nats) => Arc::new(nats),
            Err(e) => {
                eprintln!("roomcore: failed to connect to NATS at {url} ({e}), falling back to the in-process bus");
                Arc::new(LocalBus::new())
            }
        },
        Err(_) => Arc::new(LocalBus::new()),
    }
}

fn select_provider() -> Arc<dyn Provider> {
    match env::var("ROOMCORE_AI_PROVIDER").as_deref() {
        Ok("lmstudio") => Arc::new(LmStudioProvider::new()),
        _ => Arc::new(MockProvider::default()),
    }
}
