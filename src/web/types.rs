//! Most of the structs in `web` module and their implementations live here.
//! Includes structs that need to be validated, their parsing implementations and tests for those

use lazy_regex::regex_is_match;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::email_client::SendOutcome;

pub const SUBSCRIBE_SUCCESS_MSG: &str = "Check your email for confirmation";

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable signup
/// A signup as posted by the landing page form, none of the fields are validated yet.
/// `email` keeps whatever JSON value was sent, the other fields only keep strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<Value>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub recaptcha_token: Option<String>,
}

impl SignupRequest {
    /// Parses a raw request body. Only bodies that are not a JSON object fail, mistyped fields
    /// are left for validation.
    pub fn from_slice(body: &[u8]) -> Result<Self, BodyError> {
        match serde_json::from_slice(body)? {
            value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
            _ => Err(BodyError::NotAnObject),
        }
    }

    /// The bot mitigation token, if the client sent a non-blank one.
    pub fn token(&self) -> Option<&str> {
        self.recaptcha_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// The optional profile fields of a signup, blank values count as missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupDetails {
    pub role: Option<String>,
    pub company: Option<String>,
}

impl SignupDetails {
    pub fn new(role: Option<String>, company: Option<String>) -> Self {
        let present = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        Self {
            role: present(role),
            company: present(company),
        }
    }
}

/// Validated Email
/// Only checks the overall shape `local@domain.tld`, the value is kept exactly as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        // Whitespace is the ECMAScript set: U+FEFF counts, U+0085 does not.
        if regex_is_match!(
            r"^[^@\t\n\x0B\f\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]+@[^@\t\n\x0B\f\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]+\.[^@\t\n\x0B\f\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]+$",
            value
        ) {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid)
        }
    }

    /// Parses the raw `email` of a request body, anything but a string is invalid.
    pub fn parse_json(value: Option<&Value>) -> Result<Self, DataParsingError> {
        match value {
            None | Some(Value::Null) => Err(DataParsingError::EmailMissing),
            Some(Value::String(s)) => Self::parse(s),
            Some(_) => Err(DataParsingError::EmailInvalid),
        }
    }
}

/// The body of a successful subscription
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<serde_json::Value>,
}

impl SubscriptionResponse {
    pub fn success(diagnostic: Option<&SendOutcome>) -> Self {
        Self {
            success: true,
            message: SUBSCRIBE_SUCCESS_MSG.to_string(),
            diagnostic: diagnostic.and_then(|d| serde_json::to_value(d).ok()),
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("email missing")]
    EmailMissing,
    #[error("email invalid")]
    EmailInvalid,
}

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("body is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("body is not a json object")]
    NotAnObject,
}
