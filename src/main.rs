use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tourdesk::config::Config;
use tourdesk::middleware::{
    json_error_handler, path_error_handler, query_error_handler, ApiKeyAuth, RequestId,
};
use tourdesk::modules::{health, sales};
use tourdesk::sales::{MySqlSaleStore, SaleService, SaleStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!(
        env = %config.app.env,
        bind = %config.server.bind_address(),
        workers = config.server.workers,
        "Starting tourdesk"
    );

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        pool_size = config.database.pool_size,
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    let store: Arc<dyn SaleStore> = Arc::new(MySqlSaleStore::new(db_pool.clone()));
    let sale_service = Arc::new(SaleService::new(store, config.sales.max_installments));

    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(ApiKeyAuth::new(db_pool.clone()))
            .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(sale_service.clone()))
            .configure(health::configure)
            .configure(sales::controllers::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("Server terminated with an error")
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tourdesk={},actix_web=info",
            config.app.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.app.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
