use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    captcha::CaptchaVerifier, config::AppConfig, templ_manager::TemplateManager, EmailClient,
    Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let app_state = AppState::from_config(&config)?;

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

pub struct InternalState {
    pub templ_mgr: TemplateManager,
    pub email_client: EmailClient,
    /// `None` when bot mitigation is disabled.
    pub captcha_verifier: Option<CaptchaVerifier>,
    pub email_subject: String,
    pub base_url: String,
    pub site_key: Option<String>,
    pub diagnostics: bool,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(internal: InternalState) -> Self {
        AppState(Arc::new(internal))
    }

    /// Builds every client exactly once, they are shared by all requests afterwards.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let email_config = &config.email_config;
        let captcha_config = &config.captcha_config;

        let templ_mgr = TemplateManager::init().context("app: failed to load the templates")?;

        let email_client = EmailClient::new(
            &email_config.url,
            email_config.valid_sender()?,
            email_config.api_key.clone(),
            email_config.timeout(),
        )?;
        if !email_client.has_api_key() {
            warn!(
                "{:<20} - no email api key configured, welcome emails will be skipped",
                "app"
            );
        }

        let captcha_verifier = if captcha_config.enabled {
            let verifier = CaptchaVerifier::new(
                &captcha_config.url,
                captcha_config.secret.clone(),
                captcha_config.policy(),
                captcha_config.timeout(),
            )?;
            if !verifier.has_secret() {
                warn!(
                    "{:<20} - captcha enabled without a secret, every signup will be refused",
                    "app"
                );
            }
            Some(verifier)
        } else {
            info!("{:<20} - captcha verification disabled", "app");
            None
        };

        Ok(AppState::new(InternalState {
            templ_mgr,
            email_client,
            captcha_verifier,
            email_subject: email_config.subject.clone(),
            base_url: config.net_config.base_url.clone(),
            site_key: captcha_config.site_key.clone(),
            diagnostics: config.signup_config.diagnostics,
        }))
    }
}
