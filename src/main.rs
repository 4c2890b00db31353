use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use smartscore::entries::{self, EntryRepository, InMemoryEntryRepository, MongoEntryRepository};
use smartscore::shared::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartscore=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartScore entries API");

    // Repository selection via environment: a configured MongoDB URI gets the
    // managed store, otherwise entries live in process memory.
    let entry_repository: Arc<dyn EntryRepository + Send + Sync> =
        match std::env::var("MONGODB_URI") {
            Ok(uri) => {
                let database =
                    std::env::var("MONGODB_DB").unwrap_or_else(|_| "players".to_string());
                let collection = std::env::var("MONGODB_COLLECTION")
                    .unwrap_or_else(|_| "SmartScore".to_string());
                let client = mongodb::Client::with_uri_str(&uri)
                    .await
                    .expect("Failed to create MongoDB client");
                info!(
                    database = %database,
                    collection = %collection,
                    "Using MongoDB entry repository"
                );
                Arc::new(MongoEntryRepository::new(&client, &database, &collection))
            }
            Err(_) => {
                info!("MONGODB_URI not set, using in-memory entry repository");
                Arc::new(InMemoryEntryRepository::new())
            }
        };

    let app_state = AppState::new(entry_repository);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any);

    // build our application: one dispatch entry point plus a liveness probe
    let app = Router::new()
        .route("/health", get(entries::health))
        .route("/", post(entries::dispatch))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{port}");
    axum::serve(listener, app).await.unwrap();
}
