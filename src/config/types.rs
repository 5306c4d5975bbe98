//! The configuration structs used to build the AppConfig, and their impls.
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::captcha::CaptchaPolicy;
use crate::config::{ConfigError, ConfigResult};
use crate::email_client::EmailSender;
use crate::web::types::ValidEmail;

// ###################################
// ->   STRUCTS
// ###################################
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub email_config: EmailConfig,
    pub captcha_config: CaptchaConfig,
    pub signup_config: SignupConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
    pub base_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EmailConfig {
    pub url: String,
    pub sender_addr: String,
    pub sender_name: Option<String>,
    pub subject: String,
    /// Without a key the welcome email is skipped and the signup still succeeds.
    pub api_key: Option<SecretString>,
    pub timeout_millis: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CaptchaConfig {
    pub enabled: bool,
    pub url: String,
    /// With verification enabled and no secret every signup is refused.
    pub secret: Option<SecretString>,
    /// Public key handed to the reCAPTCHA script on the landing page.
    pub site_key: Option<String>,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    pub expected_action: Option<String>,
    pub timeout_millis: u64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SignupConfig {
    /// Attach the email send outcome to successful responses.
    #[serde(default)]
    pub diagnostics: bool,
}

fn default_min_score() -> f64 {
    0.5
}

// ###################################
// ->   IMPLs
// ###################################
impl EmailConfig {
    pub fn valid_sender(&self) -> ConfigResult<EmailSender> {
        let addr = ValidEmail::parse(self.sender_addr.as_str())
            .map_err(|er| ConfigError::InvalidEmail(er.to_string()))?;
        Ok(EmailSender::new(addr, self.sender_name.clone()))
    }
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

impl CaptchaConfig {
    pub fn policy(&self) -> CaptchaPolicy {
        CaptchaPolicy {
            min_score: self.min_score,
            expected_action: self.expected_action.clone(),
        }
    }
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}

// ###################################
// ->   TESTS
// ###################################
