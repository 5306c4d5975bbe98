use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use strum_macros::AsRefStr;

use crate::captcha;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("request body rejected: {0}")]
    BodyRejected(String),
    #[error("bot mitigation token missing from the request")]
    CaptchaTokenMissing,
    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("data parsing error: {0}")]
    DataParsing(#[from] super::types::DataParsingError),

    #[error("captcha error: {0}")]
    Captcha(#[from] captcha::Error),
    #[error("email client error: {0}")]
    EmailClient(#[from] crate::email_client::Error),

    #[error("templating error: {0}")]
    Tera(#[from] tera::Error),
    #[error("page rendering error: {0}")]
    PageRender(#[source] tera::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::DataParsing(_) => (StatusCode::BAD_REQUEST, InvalidEmail),
            Error::CaptchaTokenMissing => (StatusCode::BAD_REQUEST, CaptchaMissing),
            Error::Captcha(er) if er.is_rejection() => (StatusCode::FORBIDDEN, SpamDetected),
            Error::Captcha(_) => (StatusCode::SERVICE_UNAVAILABLE, CaptchaUnavailable),
            Error::PageRender(_) => (StatusCode::INTERNAL_SERVER_ERROR, PageUnavailable),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// What the client gets to see, the `Display` output is the `error` field of the response body.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Invalid email address")]
    InvalidEmail,
    #[display("reCAPTCHA validation failed")]
    CaptchaMissing,
    #[display("Spam detection failed. Please try again.")]
    SpamDetected,
    #[display("Spam detection is temporarily unavailable. Please try again later.")]
    CaptchaUnavailable,
    #[display("Failed to process subscription")]
    ServiceError,
    /// Served to browsers, rendered as a plain HTML page instead of json.
    #[display("Something went wrong on our side. Please try again later.")]
    PageUnavailable,
}

impl ClientError {
    pub fn to_response(&self, status: StatusCode) -> Response {
        match self {
            ClientError::PageUnavailable => (status, Html(format!("<p>{self}</p>"))).into_response(),
            _ => (status, Json(json!({ "error": self.to_string() }))).into_response(),
        }
    }
}
