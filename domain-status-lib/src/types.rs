//! Core data types for the NP DNS API.
//!
//! This module defines credentials, client settings, the lookup request body,
//! and the typed records both remote operations return.

use crate::error::DomainApiError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default API host. Paths under `/V1/Dns` are appended to it.
pub const DEFAULT_BASE_URL: &str = "http://api-np.jd.local";

/// Lower bound on the pause between consecutive availability checks.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

/// Caller identity used to sign every request.
///
/// Immutable once built. The token only ever leaves the process as part of an
/// MD5 digest, and `Debug` output redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_code: String,
    operator: String,
    token: String,
}

impl Credentials {
    /// Build credentials, rejecting blank fields.
    pub fn new<A, O, T>(app_code: A, operator: O, token: T) -> Result<Self, DomainApiError>
    where
        A: Into<String>,
        O: Into<String>,
        T: Into<String>,
    {
        let credentials = Self {
            app_code: app_code.into().trim().to_string(),
            operator: operator.into().trim().to_string(),
            token: token.into().trim().to_string(),
        };

        for (name, value) in [
            ("app_code", &credentials.app_code),
            ("erp", &credentials.operator),
            ("token", &credentials.token),
        ] {
            if value.is_empty() {
                return Err(DomainApiError::config(format!(
                    "credential '{}' must not be empty",
                    name
                )));
            }
        }

        Ok(credentials)
    }

    /// Application identifier registered with the NP service.
    pub fn app_code(&self) -> &str {
        &self.app_code
    }

    /// Operator identity (erp) embedded in the signature.
    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_code", &self.app_code)
            .field("operator", &self.operator)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Settings for a [`DomainStatusClient`](crate::DomainStatusClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Scheme and host of the API, without the `/V1/Dns` path
    pub base_url: String,

    /// HTTP timeout for each request
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Pause between consecutive checks in a batch
    /// Default: 500ms, never lower
    pub request_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            request_interval: MIN_REQUEST_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Point the client at a different host. Trailing slashes are dropped.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the batch pacing interval, clamped up to [`MIN_REQUEST_INTERVAL`].
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval.max(MIN_REQUEST_INTERVAL);
        self
    }
}

/// Request body for the bulk lookup endpoint.
///
/// Serializes to `{"domains": [...], ...filters}`; filter values are passed
/// through verbatim.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DomainQuery {
    pub domains: Vec<String>,

    #[serde(flatten)]
    pub filters: BTreeMap<String, Value>,
}

impl DomainQuery {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            filters: BTreeMap::new(),
        }
    }

    /// Add an optional filter such as `primary` or `service_type`.
    ///
    /// A filter named `domains` is ignored so the domain list cannot be shadowed.
    pub fn with_filter<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        let key = key.into();
        if key != "domains" {
            self.filters.insert(key, value.into());
        }
        self
    }
}

/// Metadata record for one domain, as returned by the bulk lookup.
///
/// The server decides which fields are present; only `domain` is expected.
/// Scalars are accepted as strings or numbers and kept as strings. Fields
/// this type does not know about land in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DomainInfo {
    #[serde(default)]
    pub domain: String,

    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub status_desc: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub app_env: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub app_env_sub: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub app_env_more: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub app_env_url: Option<String>,

    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub manage_name: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub manage_erp: Option<String>,

    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub org_fullname: Option<String>,
    #[serde(default, deserialize_with = "scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub authorizer: Vec<String>,

    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub is_third_buss: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,

    /// Fields returned by the server that are not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DomainInfo {
    /// Whether the record is flagged as third-party business.
    pub fn is_third_party(&self) -> bool {
        self.is_third_buss.as_deref() == Some("1")
    }
}

/// Successful bulk lookup.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct LookupResult {
    /// Match count reported by the server
    pub count: u64,
    pub infos: Vec<DomainInfo>,
}

/// Availability classes the NP service documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// -1: not registered, may be claimed
    Unregistered,
    /// 1: already resolved in DNS
    DnsBound,
    /// 2: owned by a merchant
    MerchantOwned,
    /// 3: reserved by the NP system
    SystemReserved,
    /// Any other code, passed through untouched
    Other(i64),
}

impl AvailabilityStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::Unregistered,
            1 => Self::DnsBound,
            2 => Self::MerchantOwned,
            3 => Self::SystemReserved,
            other => Self::Other(other),
        }
    }

    /// Documented meaning of the code, `None` for unknown codes.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::Unregistered => Some("domain does not exist (can be applied for)"),
            Self::DnsBound => Some("domain already resolved in DNS"),
            Self::MerchantOwned => Some("merchant domain"),
            Self::SystemReserved => Some("reserved by the NP system"),
            Self::Other(_) => None,
        }
    }
}

/// Result of one availability check.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Availability {
    /// The domain that was checked
    pub domain: String,

    /// Raw status code from the server
    pub status: i64,

    /// Server-supplied message
    pub message: String,
}

impl Availability {
    /// A domain is available exactly when the server reports `-1`.
    pub fn is_available(&self) -> bool {
        self.status == -1
    }

    pub fn classification(&self) -> AvailabilityStatus {
        AvailabilityStatus::from_code(self.status)
    }
}

/// One slot of a batch availability check, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub domain: String,
    pub result: Result<Availability, DomainApiError>,
}

impl BatchEntry {
    /// `Some(true)` available, `Some(false)` taken, `None` when the check failed.
    pub fn available(&self) -> Option<bool> {
        self.result.as_ref().ok().map(Availability::is_available)
    }
}

/// Accept a string, number or bool where the server is inconsistent; null becomes `None`.
pub(crate) fn opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string))
}

/// Accept a list of scalars, a single comma-separated string, or null.
fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(other) => scalar_to_string(other).into_iter().collect(),
        None => Vec::new(),
    })
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
