// techlab_server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use techlab_server::config::{AppConfig, LogFormat};
use techlab_server::state;
use techlab_server::web::configure_app_routes;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Plain => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing(LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()));
  tracing::info!("Starting TechLab server...");

  let app_config = AppConfig::from_env().context("loading configuration")?;
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = state::bootstrap(app_config).await?;

  tracing::info!(address = %server_address, "Binding HTTP server.");
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await
  .context("running HTTP server")
}
