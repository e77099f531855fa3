//! `session-fernet` - demo server for encrypted client-side sessions.
//!
//! SPDX-License-Identifier: MIT
//!
//! Loads configuration, sets up logging, and serves the demo app behind the
//! Fernet session layer.

use session_fernet::{
    Fernet, Result, SessionData, SessionLayer, SessionMiddleware, Settings, serve,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    if log_format.eq_ignore_ascii_case("pretty") {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let settings = Settings::from_env()?;

    let secret = settings.session_secret.clone().unwrap_or_else(|| {
        warn!("SESSION_SECRET not set; generated an ephemeral key, sessions will not survive restarts");
        Fernet::generate_key()
    });

    let mut default_value = SessionData::new();
    default_value.insert("value".to_string(), 0.into());

    let middleware =
        SessionMiddleware::new(&secret, settings.cookie.clone())?.with_default_value(default_value);

    info!(
        listen_addr = %settings.listen_addr,
        cookie_name = %settings.cookie.name,
        max_age = settings.cookie.max_age,
        same_site = %settings.cookie.same_site,
        secure = settings.cookie.secure,
        log_format = %settings.log_format,
        "Server initialized"
    );

    let listener = TcpListener::bind(settings.listen_addr).await?;
    serve(listener, SessionLayer::new(middleware), settings.concurrency_limit).await
}
