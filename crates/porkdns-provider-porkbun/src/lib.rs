// # Porkbun Record Store
//
// RecordStore implementation backed by the Porkbun JSON API v3.
//
// ## Behavior
//
// - One HTTP request per trait call; retry, backoff and cancellation are
//   owned by the Reconciler
// - 30 second HTTP timeout
// - HTTP status codes mapped onto error variants that classify correctly as
//   transient or permanent
//
// ## Security Requirements
//
// - Keys never appear in logs or Debug output
// - Empty keys are rejected before any request is made
//
// ## API Reference
//
// Every call is a JSON `POST` whose body carries `apikey` and `secretapikey`.
//
// - Create: `/dns/create/{domain}` -> `{"status":"SUCCESS","id":987}`
// - Retrieve: `/dns/retrieve/{domain}` -> `{"status":"SUCCESS","records":[...]}`
// - Edit: `/dns/edit/{domain}/{id}`
// - Delete: `/dns/delete/{domain}/{id}`
//
// Failures come back as `{"status":"ERROR","message":"..."}`, with either a
// 2xx or an error status code.

use std::time::Duration;

use async_trait::async_trait;
use porkdns_core::config::StoreConfig;
use porkdns_core::record::{RecordPayload, RemoteRecord};
use porkdns_core::traits::{RecordStore, RecordStoreFactory};
use porkdns_core::{Error, Result, StoreRegistry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Porkbun API base URL
pub const PORKBUN_API_BASE: &str = "https://api.porkbun.com/api/json/v3";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Status value of a successful response
const STATUS_SUCCESS: &str = "SUCCESS";

/// Porkbun record store
///
/// Stateless and single-shot; safe to share between tasks.
pub struct PorkbunClient {
    /// API key (`pk1_...`)
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Secret API key (`sk1_...`)
    /// ⚠️ NEVER log this value
    secret_key: String,

    /// API root, without a trailing slash
    base_url: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the keys
impl std::fmt::Debug for PorkbunClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PorkbunClient")
            .field("api_key", &"<REDACTED>")
            .field("secret_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Request body: credentials plus the optional record payload
#[derive(Serialize)]
struct AuthenticatedRequest<'a> {
    secretapikey: &'a str,
    apikey: &'a str,
    #[serde(flatten)]
    record: Option<&'a RecordPayload>,
}

/// Fields every response carries
#[derive(Deserialize)]
struct StatusEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: RecordId,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    records: Vec<RemoteRecord>,
}

#[derive(Deserialize)]
struct EmptyResponse {}

/// The create endpoint has been seen returning the id as either a JSON
/// number or a string
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordId {
    Number(u64),
    Text(String),
}

impl RecordId {
    fn into_u64(self) -> Result<u64> {
        match self {
            RecordId::Number(id) => Ok(id),
            RecordId::Text(text) => text
                .parse()
                .map_err(|_| Error::api(format!("store returned non-numeric id {:?}", text))),
        }
    }
}

impl PorkbunClient {
    /// Create a client for the public Porkbun API
    ///
    /// # Errors
    ///
    /// - `Error::Config` if either key is empty or the HTTP client cannot be
    ///   built
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();

        if api_key.is_empty() {
            return Err(Error::config("api_key cannot be an empty string"));
        }
        if secret_key.is_empty() {
            return Err(Error::config("secret_key cannot be an empty string"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            secret_key,
            base_url: PORKBUN_API_BASE.to_string(),
            client,
        })
    }

    /// Point the client at a different API root, e.g. a test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// API root in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `record` to `path` and decode a successful response as `T`
    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        record: Option<&RecordPayload>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let body = AuthenticatedRequest {
            secretapikey: &self.secret_key,
            apikey: &self.api_key,
            record,
        };

        tracing::debug!(path, "porkbun request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(describe_transport_error(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(describe_transport_error(&e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<StatusEnvelope>(&text)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(text);

            tracing::debug!(path, status = status.as_u16(), %message, "porkbun request failed");

            return Err(match status.as_u16() {
                401 | 403 => Error::auth(message),
                404 => Error::not_found(message),
                429 => Error::rate_limited(message),
                code => Error::status(code, message),
            });
        }

        let envelope: StatusEnvelope = serde_json::from_str(&text)?;
        if envelope.status != STATUS_SUCCESS {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("unexpected status {:?}", envelope.status));
            return Err(Error::api(message));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        format!("HTTP request failed: {}", err)
    }
}

#[async_trait]
impl RecordStore for PorkbunClient {
    async fn create_record(&self, domain: &str, record: &RecordPayload) -> Result<u64> {
        let response: CreateResponse = self
            .post(&format!("/dns/create/{}", domain), Some(record))
            .await?;
        response.id.into_u64()
    }

    async fn retrieve_records(&self, domain: &str) -> Result<Vec<RemoteRecord>> {
        let response: RetrieveResponse = self
            .post(&format!("/dns/retrieve/{}", domain), None)
            .await?;
        Ok(response.records)
    }

    async fn edit_record(&self, domain: &str, id: u64, record: &RecordPayload) -> Result<()> {
        let _: EmptyResponse = self
            .post(&format!("/dns/edit/{}/{}", domain, id), Some(record))
            .await?;
        Ok(())
    }

    async fn delete_record(&self, domain: &str, id: u64) -> Result<()> {
        let _: EmptyResponse = self
            .post(&format!("/dns/delete/{}/{}", domain, id), None)
            .await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "porkbun"
    }
}

/// Factory for creating Porkbun record stores
pub struct PorkbunFactory;

impl RecordStoreFactory for PorkbunFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        match config {
            StoreConfig::Porkbun {
                api_key,
                secret_key,
                base_url,
            } => {
                config.validate()?;

                let mut client = PorkbunClient::new(api_key.clone(), secret_key.clone())?;
                if let Some(base_url) = base_url {
                    client = client.with_base_url(base_url.clone());
                }
                Ok(Box::new(client))
            }
            _ => Err(Error::config("Invalid config for Porkbun record store")),
        }
    }
}

/// Register the Porkbun record store with a registry
///
/// # Example
///
/// ```rust
/// use porkdns_core::StoreRegistry;
///
/// let registry = StoreRegistry::new();
/// porkdns_provider_porkbun::register(&registry);
/// assert!(registry.has_store("porkbun"));
/// ```
pub fn register(registry: &StoreRegistry) {
    registry.register_store("porkbun", Box::new(PorkbunFactory));
}
