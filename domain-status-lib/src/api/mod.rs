//! Wire-level pieces of the NP DNS API.
//!
//! Endpoint paths, the `resStatus` response envelope, and the shared request
//! execution used by both operations.

/// Request signing
pub mod sign;

pub use sign::{format_sign_time, sign, SignedHeaders, SIGN_TIME_FORMAT};

use crate::error::DomainApiError;
use crate::types::{opt_scalar, Availability, DomainInfo, LookupResult};
use crate::utils::truncate_for_log;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, trace};

/// Bulk lookup endpoint (POST)
pub const DOMAINS_INFO_PATH: &str = "/V1/Dns/domainsInfo";

/// Availability check endpoint (GET, `?domain=`)
pub const DOMAIN_CHECK_PATH: &str = "/V1/Dns/domainCheck";

/// `resStatus` value meaning success
pub const SUCCESS_STATUS: i64 = 200;

/// `{"resStatus": ..., "resMsg": ..., "data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "resStatus", deserialize_with = "int_scalar")]
    res_status: i64,

    #[serde(rename = "resMsg", default, deserialize_with = "opt_scalar")]
    res_msg: Option<String>,

    data: Option<Value>,
}

/// `data` of a successful lookup
#[derive(Debug, Deserialize)]
struct LookupData {
    #[serde(default, deserialize_with = "opt_scalar")]
    count: Option<String>,

    infos: Option<Vec<DomainInfo>>,
}

/// `data` of a successful availability check
#[derive(Debug, Deserialize)]
struct CheckData {
    #[serde(deserialize_with = "int_scalar")]
    status: i64,

    #[serde(default, deserialize_with = "opt_scalar")]
    msg: Option<String>,
}

/// Send a prepared request and read the whole body.
///
/// Connection failures and timeouts become transport errors; any HTTP status
/// is returned to the caller for classification.
pub(crate) async fn execute(
    request: RequestBuilder,
    method: &str,
    path: &str,
) -> Result<(u16, String), DomainApiError> {
    debug!("{} {}", method, path);

    let response = request.send().await.map_err(DomainApiError::from)?;
    let status = response.status().as_u16();
    debug!("{} {} -> HTTP {}", method, path, status);

    let body = response.text().await.map_err(|e| {
        DomainApiError::transport_with_status(
            status,
            format!("failed to read response body: {}", e),
            "",
        )
    })?;
    trace!("response body: {}", truncate_for_log(&body));

    Ok((status, body))
}

/// Classify an HTTP response and unwrap the envelope's `data` as `T`.
///
/// - non-2xx HTTP status: transport error with status and raw body
/// - body not a valid envelope: transport error ("malformed response envelope")
/// - `resStatus != 200`: application error with the server's code and message
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    http_status: u16,
    body: &str,
) -> Result<T, DomainApiError> {
    if !(200..300).contains(&http_status) {
        return Err(DomainApiError::transport_with_status(
            http_status,
            format!("request failed with HTTP status {}", http_status),
            body,
        ));
    }

    let malformed = |detail: String| {
        DomainApiError::transport_with_status(
            http_status,
            format!("malformed response envelope: {}", detail),
            body,
        )
    };

    let envelope: Envelope = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

    if envelope.res_status != SUCCESS_STATUS {
        return Err(DomainApiError::application(
            envelope.res_status,
            envelope
                .res_msg
                .unwrap_or_else(|| "no message from server".to_string()),
        ));
    }

    let data = envelope
        .data
        .ok_or_else(|| malformed("missing 'data'".to_string()))?;
    serde_json::from_value(data).map_err(|e| malformed(e.to_string()))
}

/// Decode a bulk lookup response.
pub(crate) fn decode_lookup(http_status: u16, body: &str) -> Result<LookupResult, DomainApiError> {
    let data: LookupData = decode_envelope(http_status, body)?;
    let infos = data.infos.unwrap_or_default();
    let count = data
        .count
        .and_then(|c| c.trim().parse::<u64>().ok())
        .unwrap_or(infos.len() as u64);

    Ok(LookupResult { count, infos })
}

/// Decode an availability check response for `domain`.
pub(crate) fn decode_check(
    domain: &str,
    http_status: u16,
    body: &str,
) -> Result<Availability, DomainApiError> {
    let data: CheckData = decode_envelope(http_status, body)?;
    Ok(Availability {
        domain: domain.to_string(),
        status: data.status,
        message: data.msg.unwrap_or_default(),
    })
}

/// Integer that may arrive as a JSON number or a numeric string.
fn int_scalar<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("{} is not an integer", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("'{}' is not an integer", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected integer, found {}",
            other
        ))),
    }
}
