use std::time::Duration;

use url::Url;

use crate::HttpConnector;
use crate::client::{ApiClient, Endpoints};
use candela_core::CandelaError;

/// Builder for [`HttpConnector`].
///
/// The base URL is explicit configuration; nothing is read from the
/// environment.
#[derive(Debug, Clone)]
pub struct HttpConnectorBuilder {
    base_url: String,
    client: Option<reqwest::Client>,
    endpoints: Endpoints,
    user_agent: Option<String>,
    connect_timeout: Option<Duration>,
    max_bars_per_request: u32,
}

impl HttpConnector {
    /// Start building a connector against `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpConnectorBuilder {
        HttpConnectorBuilder {
            base_url: base_url.into(),
            client: None,
            endpoints: Endpoints::default(),
            user_agent: None,
            connect_timeout: None,
            max_bars_per_request: 1000,
        }
    }
}

impl HttpConnectorBuilder {
    /// Use an existing `reqwest::Client` (connection pool, proxies, TLS).
    ///
    /// `user_agent` and `connect_timeout` are ignored when a client is given.
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Override the request paths.
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the `User-Agent` header of the internally built client.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the TCP connect timeout of the internally built client.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Largest candle page the upstream accepts.
    #[must_use]
    pub const fn max_bars_per_request(mut self, cap: u32) -> Self {
        self.max_bars_per_request = cap;
        self
    }

    /// Build the connector.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unparsable or non-HTTP base URL or a zero
    /// page cap, and `Connector` if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<HttpConnector, CandelaError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|e| CandelaError::InvalidArg(format!("invalid base url {raw}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CandelaError::InvalidArg(format!(
                "base url must be http(s), got {}",
                base.scheme()
            )));
        }
        if self.max_bars_per_request == 0 {
            return Err(CandelaError::InvalidArg(
                "max bars per request must be > 0".into(),
            ));
        }
        let http = match self.client {
            Some(c) => c,
            None => {
                let mut b = reqwest::Client::builder();
                if let Some(ua) = self.user_agent {
                    b = b.user_agent(ua);
                }
                if let Some(t) = self.connect_timeout {
                    b = b.connect_timeout(t);
                }
                b.build()
                    .map_err(|e| CandelaError::connector(HttpConnector::NAME, e.to_string()))?
            }
        };
        Ok(HttpConnector {
            api: ApiClient {
                name: HttpConnector::NAME,
                http,
                base,
                endpoints: self.endpoints,
            },
            max_bars_per_request: self.max_bars_per_request,
        })
    }
}
