use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use autofill_api::autofill::field_types::FieldTypeCatalog;
use autofill_api::autofill::orchestrator::AutofillEngine;
use autofill_api::autofill::platform::PlatformCatalog;
use autofill_api::config::Config;
use autofill_api::db::create_pool;
use autofill_api::resume::parser::ResumeParser;
use autofill_api::routes::build_router;
use autofill_api::state::AppState;
use autofill_api::store::{PgProfileStore, S3DocumentStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Autofill API v{}", env!("CARGO_PKG_VERSION"));

    // Catalogs are static configuration: compile once, share everywhere
    let field_types =
        Arc::new(FieldTypeCatalog::builtin().context("Invalid built-in field-type catalog")?);
    let platforms =
        Arc::new(PlatformCatalog::builtin().context("Invalid built-in platform catalog")?);
    info!(
        "Catalogs loaded: {} field types, {} platforms",
        field_types.len(),
        platforms.len()
    );
    let engine = Arc::new(AutofillEngine::new(field_types, platforms, config.autofill));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let state = AppState {
        engine,
        profiles: Arc::new(PgProfileStore::new(db)),
        documents: Arc::new(S3DocumentStore::new(s3, config.s3_bucket.clone())),
        resume_parser: Arc::new(ResumeParser::new().context("Invalid resume parser pattern")?),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "autofill-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
