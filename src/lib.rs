//! Backend of the early access landing page: serves the signup form and handles
//! `POST /api/email/subscribe`.

pub mod app;
pub mod captcha;
pub mod config;
pub mod email_client;
mod error;
pub mod templ_manager;
pub mod web;

pub use app::{App, AppState};
pub use email_client::EmailClient;
pub use error::{Error, Result};
pub use web::serve::serve;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "waitlist=debug,tower_http=info,info";

/// Human readable logs for local development.
pub fn init_dbg_tracing() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .compact(),
        )
        .init();
}

/// JSON logs, one object per line.
pub fn init_production_tracing() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .json()
                .with_current_span(true),
        )
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
