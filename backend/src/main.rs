use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guestlist_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{PgAttendeeStore, PgEmailTemplateStore, PgEventStore, PgUserStore},
    routes::api_router,
    state::AppState,
    utils::{email::SmtpMailer, qr::QrCdnUploader},
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guestlist_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_seconds = config.jwt_expiration_seconds,
        is_production = config.is_production,
        public_host = %config.public_host,
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Wire collaborators behind their seams
    let mailer = Arc::new(SmtpMailer::from_config(&config)?);
    let images = Arc::new(QrCdnUploader::from_config(&config));
    let state = AppState::new(
        config.clone(),
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgEventStore::new(pool.clone())),
        Arc::new(PgAttendeeStore::new(pool.clone())),
        Arc::new(PgEmailTemplateStore::new(pool)),
        mailer,
        images,
    );

    let app = api_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
