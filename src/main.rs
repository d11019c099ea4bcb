//! Wastemap server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use sea_orm_migration::MigratorTrait;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use wastemap_lib::api;
use wastemap_lib::config::Config;
use wastemap_lib::db::DbPool;
use wastemap_lib::middleware::RequestLogger;
use wastemap_lib::migration::Migrator;
use wastemap_lib::services::{
    FileReader, HdfsClient, LocalCache, RecordLocks, StoreHandle, UploadCoordinator,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, HDFS_URL and UPLOAD_DIR must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Wastemap Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and HDFS_URL");
    }

    // Create the local fallback cache directories
    let cache = LocalCache::new(config.upload_dir.clone());
    cache
        .init()
        .await
        .expect("Failed to create upload cache directory");
    info!("Local fallback cache at {}", cache.root().display());

    // Initialize database and run migrations
    let pool = DbPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    info!("Database connection established");

    Migrator::up(pool.connection(), None)
        .await
        .expect("Failed to run migrations");
    info!("Database migrations complete");

    // Distributed store client and the persistence components around it
    let store: StoreHandle =
        Arc::new(HdfsClient::new(&config.hdfs).expect("Failed to build HDFS client"));
    info!(
        "HDFS client configured for {} (user: {}, root: {})",
        config.hdfs.url, config.hdfs.user, config.hdfs.root
    );

    let coordinator = web::Data::new(UploadCoordinator::new(
        store.clone(),
        cache,
        config.hdfs.root.clone(),
    ));
    let reader = web::Data::new(FileReader::new(store));
    let locks = web::Data::new(RecordLocks::new());
    let pool_data = web::Data::new(pool);
    let max_upload_size = web::Data::new(config.max_upload_size);

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let payload_limit = config.max_upload_size;

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Permissive CORS for development (the map frontend runs on its own
        // origin); restrictive in production
        let cors = if is_development {
            Cors::permissive()
        } else {
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            // Add request logging middleware
            .wrap(RequestLogger)
            // Add shared state
            .app_data(pool_data.clone())
            .app_data(coordinator.clone())
            .app_data(reader.clone())
            .app_data(locks.clone())
            .app_data(max_upload_size.clone())
            // Allow multipart overhead at the HTTP layer - the actual limit
            // is enforced while streaming the file field
            .app_data(web::PayloadConfig::new(payload_limit * 2))
            // API routes
            .configure(api::configure_health_routes)
            .configure(api::configure_waste_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            )
    });

    // Set worker count
    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
