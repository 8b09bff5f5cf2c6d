//! Main NP DNS API client.
//!
//! `DomainStatusClient` signs every request, runs the two remote operations,
//! and paces batch availability checks.

use crate::api::{self, SignedHeaders, DOMAINS_INFO_PATH, DOMAIN_CHECK_PATH};
use crate::error::DomainApiError;
use crate::types::{Availability, BatchEntry, ClientConfig, Credentials, DomainQuery, LookupResult};
use futures_util::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, info};

/// Signed client for the NP DNS-management API.
///
/// Holds only immutable credentials and settings, so one instance can be
/// cloned and shared freely. The client never retries; see
/// [`DomainApiError::is_retryable`] for a hint when building retry policy.
///
/// # Example
///
/// ```rust,no_run
/// use domain_status_lib::{ClientConfig, Credentials, DomainQuery, DomainStatusClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let credentials = Credentials::new("my-app", "my.erp", "my-token")?;
///     let client = DomainStatusClient::new(credentials, ClientConfig::default())?;
///
///     let lookup = client.lookup_domains(&DomainQuery::new(["jd.local"])).await?;
///     println!("{} records", lookup.count);
///
///     let check = client.check_availability("test.jd.com").await?;
///     println!("available: {}", check.is_available());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DomainStatusClient {
    /// Shared HTTP connection pool
    http_client: reqwest::Client,
    credentials: Credentials,
    config: ClientConfig,
}

impl DomainStatusClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `DomainApiError::Config` if the base URL is not http(s) or the
    /// HTTP client cannot be built.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, DomainApiError> {
        // Normalises trailing slashes and the interval floor even when the
        // caller filled the struct directly.
        let config = ClientConfig::default()
            .with_base_url(config.base_url)
            .with_timeout(config.timeout)
            .with_request_interval(config.request_interval);

        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(DomainApiError::config(format!(
                "base URL '{}' must start with http:// or https://",
                config.base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("domain-status/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainApiError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            credentials,
            config,
        })
    }

    /// Look up metadata for a list of domains in a single request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if `query.domains` is empty (nothing is sent)
    /// - `Transport` on connection failure, timeout, non-2xx status, or an
    ///   unreadable envelope
    /// - `Application` when the server's `resStatus` is not 200
    pub async fn lookup_domains(&self, query: &DomainQuery) -> Result<LookupResult, DomainApiError> {
        if query.domains.is_empty() {
            return Err(DomainApiError::invalid_request(
                "domain lookup needs at least one domain",
            ));
        }

        let request = self
            .http_client
            .post(self.url(DOMAINS_INFO_PATH))
            .headers(self.signed_headers()?)
            .json(query);

        let (status, body) = api::execute(request, "POST", DOMAINS_INFO_PATH).await?;
        let result = api::decode_lookup(status, &body)?;

        debug!(
            requested = query.domains.len(),
            returned = result.infos.len(),
            "domain lookup finished"
        );
        Ok(result)
    }

    /// Check whether a single domain is still available.
    ///
    /// Server status codes are passed through; only `-1` counts as available.
    ///
    /// # Errors
    ///
    /// Same classification as [`lookup_domains`](Self::lookup_domains);
    /// `InvalidRequest` for a blank domain.
    pub async fn check_availability(&self, domain: &str) -> Result<Availability, DomainApiError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(DomainApiError::invalid_request("domain must not be empty"));
        }

        let request = self
            .http_client
            .get(self.url(DOMAIN_CHECK_PATH))
            .headers(self.signed_headers()?)
            .query(&[("domain", domain)]);

        let (status, body) = api::execute(request, "GET", DOMAIN_CHECK_PATH).await?;
        api::decode_check(domain, status, &body)
    }

    /// Check domains one after another, pausing `request_interval` between
    /// calls, and yield each entry as soon as it completes.
    ///
    /// Entries come out in input order. A failed check occupies its own slot
    /// and does not stop the stream.
    pub fn check_availability_stream<'a>(
        &'a self,
        domains: &[String],
    ) -> Pin<Box<dyn Stream<Item = BatchEntry> + Send + 'a>> {
        let interval = self.config.request_interval;
        let total = domains.len();

        let stream = stream::iter(domains.to_vec().into_iter().enumerate()).then(
            move |(index, domain)| async move {
                if index > 0 {
                    tokio::time::sleep(interval).await;
                }

                let result = self.check_availability(&domain).await;
                match &result {
                    Ok(availability) => info!(
                        "[{}/{}] {}: status {} ({})",
                        index + 1,
                        total,
                        domain,
                        availability.status,
                        availability.message
                    ),
                    Err(e) => info!("[{}/{}] {}: {}", index + 1, total, domain, e),
                }

                BatchEntry { domain, result }
            },
        );

        Box::pin(stream)
    }

    /// Check every domain sequentially and collect the results in input order.
    ///
    /// An empty input returns an empty vector without touching the network.
    pub async fn check_availability_batch(&self, domains: &[String]) -> Vec<BatchEntry> {
        self.check_availability_stream(domains).collect().await
    }

    /// Get the settings this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Fresh headers for every request; the signature is bound to the send time.
    fn signed_headers(&self) -> Result<reqwest::header::HeaderMap, DomainApiError> {
        SignedHeaders::now(&self.credentials).to_header_map()
    }
}
