use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::web::types::ValidEmail;

/// The identity welcome emails are sent from, rendered as `Name <addr>` when a name is set.
#[derive(Debug, Clone)]
pub struct EmailSender {
    addr: ValidEmail,
    name: Option<String>,
}

impl EmailSender {
    pub fn new(addr: ValidEmail, name: Option<String>) -> Self {
        let name = name.filter(|n| !n.trim().is_empty());
        Self { addr, name }
    }
}

impl core::fmt::Display for EmailSender {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.addr.as_ref()),
            None => write!(f, "{}", self.addr.as_ref()),
        }
    }
}

/// A client for a Resend compatible transactional email API.
/// Built once on startup and shared between requests.
#[derive(Debug)]
pub struct EmailClient {
    pub http_client: Client,
    pub url: reqwest::Url,
    pub sender: EmailSender,
    api_key: Option<SecretString>,
}

impl EmailClient {
    pub fn new<S: AsRef<str>>(
        url: S,
        sender: EmailSender,
        api_key: Option<SecretString>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let url =
            reqwest::Url::parse(url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(EmailClient {
            http_client,
            url,
            sender,
            api_key,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn send_email<S>(
        &self,
        recipient: &ValidEmail,
        subject: S,
        html_content: S,
        text_content: S,
    ) -> Result<SentEmail>
    where
        S: AsRef<str>,
    {
        let api_key = self.api_key.as_ref().ok_or(Error::MissingApiKey)?;

        let url = self
            .url
            .join("emails")
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let from = self.sender.to_string();
        let email_content = EmailContent {
            from: &from,
            to: [recipient.as_ref()],
            subject: subject.as_ref(),
            html: html_content.as_ref(),
            text: text_content.as_ref(),
        };

        let resp = self
            .http_client
            .post(url)
            .bearer_auth(api_key.expose_secret())
            .json(&email_content)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ProviderError>(&body)
                .ok()
                .and_then(|er| er.message)
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            return Err(Error::Provider { status, message });
        }

        // The provider id is informational, an unexpected body still means the email was accepted.
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }
}

#[derive(Serialize)]
pub struct EmailContent<'a> {
    pub from: &'a str,
    pub to: [&'a str; 1],
    pub subject: &'a str,
    pub html: &'a str,
    pub text: &'a str,
}

/// What the provider answers when it accepts an email.
#[derive(Debug, Default, Deserialize)]
pub struct SentEmail {
    pub id: Option<String>,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
}

/// The outcome of a best-effort send, only ever logged or reported as a diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SendOutcome {
    pub fn delivered(sent_email: SentEmail) -> Self {
        Self {
            sent: true,
            provider_message_id: sent_email.id,
            failure_reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            sent: false,
            provider_message_id: None,
            failure_reason: Some(reason.into()),
        }
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, derive_more::From)]
pub enum Error {
    MissingApiKey,
    UrlParsing(String),
    Provider {
        status: StatusCode,
        message: String,
    },
    #[from]
    Reqwest(reqwest::Error),
}
// Error Boilerplate
impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Self::MissingApiKey => write!(fmt, "email provider api key is not configured"),
            Self::Provider { status, message } => {
                write!(fmt, "email provider responded with {status}: {message}")
            }
            _ => write!(fmt, "{self:?}"),
        }
    }
}

impl std::error::Error for Error {}
