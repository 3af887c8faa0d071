use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod domain;
mod error;
mod model;
mod models;
mod routes;
mod store;

use config::Config;
use db::{MySqlLedgerWriter, init_db, load_ledgers, load_master_data};

use crate::domain::audit::TracingAuditSink;
use crate::domain::calendar::HolidayCalendar;
use crate::domain::catalog::LeaveTypeCatalog;
use crate::domain::clock::SystemClock;
use crate::domain::directory::EmployeeDirectory;
use crate::domain::service::HrmService;
use crate::docs::ApiDoc;
use crate::store::Store;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM leave & attendance service"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let holidays = Arc::new(HolidayCalendar::new());
    let catalog = Arc::new(LeaveTypeCatalog::new());
    let directory = Arc::new(EmployeeDirectory::new());
    if let Err(e) = load_master_data(&pool, &holidays, &catalog, &directory).await {
        error!(error = ?e, "Failed to load master data");
        return Err(std::io::Error::other(e.to_string()));
    }

    let service = Data::new(HrmService::new(
        catalog,
        holidays.clone(),
        directory,
        Arc::new(TracingAuditSink),
        Arc::new(SystemClock),
        config.leave_policy(),
    ));
    if let Err(e) = load_ledgers(&pool, &service).await {
        error!(error = ?e, "Failed to load ledgers");
        return Err(std::io::Error::other(e.to_string()));
    }
    let store = Data::new(Store::new(Arc::new(MySqlLedgerWriter::new(pool))));
    let holiday_data = Data::from(holidays);

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(service.clone())
            .app_data(holiday_data.clone())
            .app_data(store.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
