//! Shared HTTP client for package index lookups
//!
//! - 30 second timeout and a `uvrepin/<version>` User-Agent
//! - Up to 3 retries with exponential backoff on transport errors, HTTP 429
//!   and undecodable JSON bodies
//! - 404 and other non-success statuses are returned immediately

use crate::error::RegistryError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("uvrepin/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

/// Outcome of a single attempt
enum Attempt<T> {
    Done(Result<T, RegistryError>),
    Retry(RegistryError),
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                RegistryError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// GET `url` and decode the JSON body
    ///
    /// `package` and `registry` only label errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<T, RegistryError> {
        let mut delay = BASE_DELAY_MS;
        let mut attempt = 0;

        loop {
            let error = match self.attempt::<T>(url, package, registry).await {
                Attempt::Done(result) => return result,
                Attempt::Retry(error) => error,
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            tracing::debug!(url, attempt, %error, "retrying index request");
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay *= 2;
            attempt += 1;
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Attempt<T> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::Retry(RegistryError::timeout(package, registry));
            }
            Err(e) => {
                return Attempt::Retry(RegistryError::network_error(
                    package,
                    registry,
                    e.to_string(),
                ));
            }
        };

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Attempt::Retry(RegistryError::RateLimitExceeded {
                    registry: registry.to_string(),
                });
            }
            StatusCode::NOT_FOUND => {
                return Attempt::Done(Err(RegistryError::package_not_found(package, registry)));
            }
            status if !status.is_success() => {
                return Attempt::Done(Err(RegistryError::network_error(
                    package,
                    registry,
                    format!("HTTP {}", status),
                )));
            }
            _ => {}
        }

        match response.json::<T>().await {
            Ok(parsed) => Attempt::Done(Ok(parsed)),
            Err(e) => Attempt::Retry(RegistryError::invalid_response(
                package,
                registry,
                format!("failed to parse JSON: {}", e),
            )),
        }
    }
}
