use tracing_subscriber::EnvFilter;

use attesta::api;
use attesta::config::{self, Settings};

#[tokio::main]
async fn main() -> Result<(), api::ServeError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env();
    if settings.uses_placeholder_service_key() {
        tracing::warn!(
            "SERVICE_API_KEY is the placeholder value; set a real key before exposing this service"
        );
    }

    api::serve(&settings).await
}
