// # HTTP Inventory
//
// Lists instances from an inventory service that speaks JSON over HTTP(S).
//
// ## Protocol
//
// ```http
// GET <url>?state=running&tag_key=substrate:zone&tag_value=corp
// Authorization: Bearer <token>
// ```
//
// The response body is an `InventoryDocument`:
//
// ```json
// {"instances": [{"id": "i-1", "private_address": "10.0.0.5", "state": "running", "tags": {...}}]}
// ```
//
// The filter is applied again on the client, so a service that ignores the
// query parameters still yields only matching instances.
//
// ## Failure Handling
//
// Every query is a single request. Retry and backoff belong to the
// `Watcher`; this crate only maps the failure to an error:
//
// | Response            | Error            |
// |---------------------|------------------|
// | transport failure   | `Http`           |
// | 401 / 403           | `Authentication` |
// | 404                 | `NotFound`       |
// | 429                 | `RateLimited`    |
// | any other non-2xx   | `Http`           |
// | malformed body      | `Json`           |
//
// ## Security
//
// The bearer token never appears in logs or `Debug` output.

use async_trait::async_trait;
use dnswatch_core::config::InventoryConfig;
use dnswatch_core::traits::{
    InstanceFilter, InstanceRecord, Inventory, InventoryDocument, InventoryFactory,
};
use dnswatch_core::{Error, InventoryRegistry, Result};
use reqwest::StatusCode;
use std::time::Duration;

/// Default HTTP timeout for inventory requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Inventory backed by an HTTP JSON endpoint
pub struct HttpInventory {
    /// Endpoint URL, without query parameters
    url: String,

    /// Optional bearer token
    /// ⚠️ NEVER log this value
    token: Option<String>,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for HttpInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInventory")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl HttpInventory {
    /// Create an HTTP inventory
    ///
    /// An empty token is treated as no token.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parse a response body and keep the instances matching `filter`
    pub fn parse_response(body: &str, filter: &InstanceFilter) -> Result<Vec<InstanceRecord>> {
        Ok(InventoryDocument::parse(body)?.into_matching(filter))
    }

    fn status_error(status: StatusCode, body: &str) -> Error {
        match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "Inventory rejected credentials. Status: {}",
                status
            )),
            404 => Error::not_found(format!("Inventory endpoint not found. Status: {}", status)),
            429 => Error::rate_limited(format!(
                "Inventory rate limit exceeded. Status: {}",
                status
            )),
            _ => Error::http(format!("Inventory query failed: {} - {}", status, body)),
        }
    }
}

#[async_trait]
impl Inventory for HttpInventory {
    async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<InstanceRecord>> {
        tracing::debug!(
            "Querying inventory {} for {}={}",
            self.url,
            filter.tag_key,
            filter.tag_value
        );

        let mut request = self.client.get(&self.url).query(&[
            ("state", filter.state.as_str()),
            ("tag_key", filter.tag_key.as_str()),
            ("tag_value", filter.tag_value.as_str()),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        let instances = Self::parse_response(&body, filter)?;
        tracing::debug!("Inventory returned {} matching instances", instances.len());
        Ok(instances)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP inventories
pub struct HttpInventoryFactory;

impl InventoryFactory for HttpInventoryFactory {
    fn create(&self, config: &InventoryConfig) -> Result<Box<dyn Inventory>> {
        match config {
            InventoryConfig::Http {
                url,
                token,
                timeout_secs,
            } => {
                if url.is_empty() {
                    return Err(Error::config("HTTP inventory URL is required"));
                }

                Ok(Box::new(HttpInventory::new(
                    url.clone(),
                    token.clone(),
                    Duration::from_secs(*timeout_secs),
                )?))
            }
            _ => Err(Error::config("Invalid config for HTTP inventory")),
        }
    }
}

/// Register the HTTP inventory with a registry
///
/// # Example
///
/// ```rust
/// use dnswatch_core::InventoryRegistry;
///
/// let registry = InventoryRegistry::with_builtins();
/// dnswatch_inventory_http::register(&registry);
/// assert!(registry.has_inventory("http"));
/// ```
pub fn register(registry: &InventoryRegistry) {
    registry.register_inventory("http", Box::new(HttpInventoryFactory));
}
