//! Bot mitigation through reCAPTCHA (v3) token verification.
//!
//! `CaptchaVerifier::verify` only talks to the verification service, `Verification::judge`
//! applies the acceptance policy. Anything that keeps us from getting a usable answer out of the
//! service is reported as `Error::Unavailable`/`Error::MissingSecret` and never as a rejection.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct CaptchaPolicy {
    /// Scores strictly below this are rejected.
    pub min_score: f64,
    /// Reject tokens minted for a different action than this one.
    pub expected_action: Option<String>,
}

impl Default for CaptchaPolicy {
    fn default() -> Self {
        Self {
            min_score: 0.5,
            expected_action: None,
        }
    }
}

#[derive(Debug)]
pub struct CaptchaVerifier {
    http_client: Client,
    url: reqwest::Url,
    secret: Option<SecretString>,
    policy: CaptchaPolicy,
}

impl CaptchaVerifier {
    pub fn new<S: AsRef<str>>(
        url: S,
        secret: Option<SecretString>,
        policy: CaptchaPolicy,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let url =
            reqwest::Url::parse(url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Unavailable)?;

        Ok(Self {
            http_client,
            url,
            secret,
            policy,
        })
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Asks the verification service about `token`, does not apply the policy.
    pub async fn verify(&self, token: &str) -> Result<Verification> {
        let secret = self.secret.as_ref().ok_or(Error::MissingSecret)?;

        let resp = self
            .http_client
            .post(self.url.clone())
            .form(&[("secret", secret.expose_secret()), ("response", token)])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(Error::Unavailable)?;

        let body = resp.bytes().await.map_err(Error::Unavailable)?;
        let verification: Verification = serde_json::from_slice(&body)
            .map_err(|er| Error::MalformedResponse(er.to_string()))?;

        debug!(
            "{:<12} - success: {}, score: {:?}, action: {:?}",
            "captcha", verification.accepted, verification.confidence, verification.action
        );

        Ok(verification)
    }

    /// Verifies `token` and applies the configured policy to the answer.
    pub async fn check(&self, token: &str) -> Result<Verification> {
        let verification = self.verify(token).await?;
        verification.judge(&self.policy)?;
        Ok(verification)
    }
}

/// The answer of the verification service.
#[derive(Debug, Clone, Deserialize)]
pub struct Verification {
    #[serde(rename = "success")]
    pub accepted: bool,
    #[serde(rename = "score")]
    pub confidence: Option<f64>,
    pub action: Option<String>,
    pub hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

impl Verification {
    pub fn judge(&self, policy: &CaptchaPolicy) -> Result<()> {
        if !self.accepted {
            return Err(Error::Rejected(RejectReason::NotAccepted(
                self.error_codes.join(","),
            )));
        }

        if let Some(score) = self.confidence {
            if score < policy.min_score {
                return Err(Error::Rejected(RejectReason::LowScore(score)));
            }
        }

        if let (Some(expected), Some(action)) = (&policy.expected_action, &self.action) {
            if expected != action {
                return Err(Error::Rejected(RejectReason::ActionMismatch(
                    action.clone(),
                )));
            }
        }

        Ok(())
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("captcha secret is not configured")]
    MissingSecret,
    #[error("invalid verification url: {0}")]
    UrlParsing(String),
    #[error("verification service unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),
    #[error("verification service sent a malformed response: {0}")]
    MalformedResponse(String),
    #[error("verification rejected: {0}")]
    Rejected(RejectReason),
}

impl Error {
    /// `true` if the token was looked at and refused, `false` if it couldn't be checked at all.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

#[derive(Debug, derive_more::Display)]
pub enum RejectReason {
    #[display("token not accepted [{_0}]")]
    NotAccepted(String),
    #[display("score {_0} below threshold")]
    LowScore(f64),
    #[display("unexpected action '{_0}'")]
    ActionMismatch(String),
}
