//! # Domain Status Library
//!
//! Async client for the NP DNS-management API: bulk domain metadata lookups
//! and paced domain availability checks, with per-request MD5 signing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_status_lib::{ClientConfig, Credentials, DomainStatusClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("my-app", "my.erp", "my-token")?;
//!     let client = DomainStatusClient::new(credentials, ClientConfig::default())?;
//!
//!     let result = client.check_availability("example.jd.local").await?;
//!     println!("{} - available: {}", result.domain, result.is_available());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Signed requests**: `appCode`, `erp`, `timestamp` and `sign` headers on every call
//! - **Bulk lookup**: one POST for any number of domains, optional filters
//! - **Paced batches**: sequential checks at least 500ms apart, results in input order
//! - **Typed errors**: transport failures kept apart from server-side rejections
//! - **Configurable**: TOML files and DS_* environment variables

pub use api::{format_sign_time, sign, SignedHeaders, SIGN_TIME_FORMAT};
pub use api::{DOMAINS_INFO_PATH, DOMAIN_CHECK_PATH, SUCCESS_STATUS};
pub use client::DomainStatusClient;
pub use config::{
    load_env_config, load_env_config_from, parse_duration_string, ClientSection, ConfigManager,
    CredentialsConfig, EnvConfig, FileConfig, OutputConfig, OUTPUT_FORMATS,
};
pub use error::DomainApiError;
pub use types::{
    Availability, AvailabilityStatus, BatchEntry, ClientConfig, Credentials, DomainInfo,
    DomainQuery, LookupResult, DEFAULT_BASE_URL, MIN_REQUEST_INTERVAL,
};
pub use utils::{normalize_domains, parse_domain_lines, read_domains_file};

/// Wire format and request signing
pub mod api;

mod client;
mod config;
mod error;
mod types;
mod utils;

pub type Result<T> = std::result::Result<T, DomainApiError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
