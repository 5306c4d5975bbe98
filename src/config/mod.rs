//! Tries to create an `AppConfig` from config files and the environment.
//! Layers `base.toml`, the environment specific file, `APP_` prefixed env variables and the
//! well known secret variables on top of each other with `figment`.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::{path::Path, sync::OnceLock};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{
    AppConfig, CaptchaConfig, EmailConfig, Environment, NetConfig, SignupConfig,
};

/// Secret env variables and the config keys they end up in.
const SECRET_ENV_VARS: [(&str, &str); 3] = [
    ("RESEND_API_KEY", "email_config.api_key"),
    ("RECAPTCHA_SECRET_KEY", "captcha_config.secret"),
    ("RECAPTCHA_SITE_KEY", "captcha_config.site_key"),
];

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<12} - Initializing the configuration",
            "get_or_init_config"
        );
        AppConfig::load().unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}

impl AppConfig {
    /// Loads the configuration from the `config` directory in the current working directory.
    /// The environment is selected with `APP_ENVIRONMENT` and defaults to `local`.
    pub fn load() -> ConfigResult<Self> {
        let config_dir = std::env::current_dir()?.join("config");
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()?;

        let config: AppConfig = Self::figment(&config_dir, &environment).extract()?;
        config.validate()?;

        Ok(config)
    }

    /// Builds up the `Figment` for the given environment, later providers override earlier ones.
    pub fn figment(config_dir: &Path, environment: &Environment) -> Figment {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut figment = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"));

        for (var, key) in SECRET_ENV_VARS {
            figment = figment.merge(Env::raw().only(&[var]).map(move |_| key.into()));
        }

        figment
    }

    /// Checks the values `serde` can't check on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        self.email_config.valid_sender()?;

        let min_score = self.captcha_config.min_score;
        if !(0.0..=1.0).contains(&min_score) {
            return Err(ConfigError::ScoreOutOfRange(min_score));
        }

        Ok(())
    }
}
