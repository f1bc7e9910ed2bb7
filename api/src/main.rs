use std::net::SocketAddr;
use std::sync::Arc;

use api::routes::routes;
use api::services::email::SmtpMailer;
use api::state::{AppState, ServiceSettings};
use axum::Router;
use migration::{Migrator, MigratorTrait};
use services::password_reset::{LogMailer, ResetMailer};
use tower_http::cors::CorsLayer;
use tracing_appender::rolling;
use util::config;

#[tokio::main]
async fn main() {
    // Load configuration and initialize logging
    let _log_guard = init_logging(&config::log_file(), &config::log_level());

    let db = db::connect().await.expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let app_state = AppState::new(db, reset_mailer(), ServiceSettings::from_config());

    let cors = CorsLayer::very_permissive();
    let app = Router::new().nest("/api", routes(app_state)).layer(cors);

    let addr: SocketAddr = format!("{}:{}", config::host(), config::port())
        .parse()
        .expect("Invalid address");

    tracing::info!(
        "Starting {} on http://{}:{}",
        config::project_name(),
        config::host(),
        config::port()
    );

    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Server crashed");
}

fn reset_mailer() -> Arc<dyn ResetMailer> {
    match SmtpMailer::from_config() {
        Some(Ok(mailer)) => Arc::new(mailer),
        Some(Err(err)) => {
            tracing::error!(error = %err, "SMTP misconfigured, reset codes will only be logged");
            Arc::new(LogMailer)
        }
        None => {
            tracing::warn!("SMTP_USERNAME not set, reset codes will only be logged");
            Arc::new(LogMailer)
        }
    }
}

fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = config::log_to_stdout().then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(true)
    });

    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("api=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}
