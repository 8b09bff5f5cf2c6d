//! NP shared-secret request signing.
//!
//! `sign = md5_hex("{erp}#{token}NP{%H%M%Y%m%d in local time}")`, sent next to
//! the epoch-seconds timestamp of the same instant. The server recomputes the
//! digest inside its tolerance window, so headers are built per request.

use crate::error::DomainApiError;
use crate::types::Credentials;
use chrono::{DateTime, Local, TimeZone};
use md5::{Digest, Md5};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::fmt::Display;

/// Hour, minute, year, month, day; zero-padded, no separators.
pub const SIGN_TIME_FORMAT: &str = "%H%M%Y%m%d";

const APP_CODE_HEADER: &str = "appcode";
const ERP_HEADER: &str = "erp";
const TIMESTAMP_HEADER: &str = "timestamp";
const SIGN_HEADER: &str = "sign";

/// Format an instant the way the signature expects, in the instant's own zone.
pub fn format_sign_time<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.format(SIGN_TIME_FORMAT).to_string()
}

/// Lowercase hex MD5 over `{operator}#{token}NP{time}`.
pub fn sign<Tz>(operator: &str, token: &str, instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let payload = format!("{}#{}NP{}", operator, token, format_sign_time(instant));
    hex::encode(Md5::digest(payload.as_bytes()))
}

/// Authentication headers for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub app_code: String,
    pub operator: String,
    /// Unix seconds of the signing instant
    pub timestamp: i64,
    pub sign: String,
}

impl SignedHeaders {
    /// Sign for an explicit instant. The instant's time zone drives the
    /// formatted time string; the timestamp is always epoch seconds.
    pub fn new<Tz>(credentials: &Credentials, instant: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            app_code: credentials.app_code().to_string(),
            operator: credentials.operator().to_string(),
            timestamp: instant.timestamp(),
            sign: sign(credentials.operator(), credentials.token(), instant),
        }
    }

    /// Sign for the current moment in the local time zone.
    pub fn now(credentials: &Credentials) -> Self {
        Self::new(credentials, &Local::now())
    }

    /// Render as HTTP headers, including `Content-type: application/json`.
    pub fn to_header_map(&self) -> Result<HeaderMap, DomainApiError> {
        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(APP_CODE_HEADER),
            header_value("appCode", &self.app_code)?,
        );
        headers.insert(
            HeaderName::from_static(ERP_HEADER),
            header_value("erp", &self.operator)?,
        );
        headers.insert(
            HeaderName::from_static(TIMESTAMP_HEADER),
            header_value("timestamp", &self.timestamp.to_string())?,
        );
        headers.insert(
            HeaderName::from_static(SIGN_HEADER),
            header_value("sign", &self.sign)?,
        );
        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, DomainApiError> {
    HeaderValue::from_str(value).map_err(|_| {
        DomainApiError::config(format!(
            "value for header '{}' contains characters not allowed in HTTP headers",
            name
        ))
    })
}
