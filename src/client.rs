use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_CHARSET, AUTHORIZATION};
use reqwest::{IntoUrl, Method};
use serde::Deserialize;
use tracing::debug;

use crate::key::{ClientProperties, Credentials};

const DEFAULT_USER_AGENT: &str = "webclient-cache";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("failed to construct client: {0}")]
    Construction(String),
}

/// Transport settings shared by every client a builder produces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A long-lived HTTP client configured for one [`ClientProperties`] key.
///
/// The key's credentials are part of the client's default headers, so every
/// request sent through [`ClientHandle::client`] is authenticated. Handles are
/// built once, never mutated afterwards, and shared behind an `Arc` for the
/// rest of the process. The wrapped [`Client`] owns a connection pool, so
/// keeping it alive is cheaper than rebuilding it.
#[derive(Debug)]
pub struct ClientHandle {
    client: Client,
    properties: ClientProperties,
    accept_charset: HeaderValue,
}

impl ClientHandle {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn properties(&self) -> &ClientProperties {
        &self.properties
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.properties.credentials()
    }

    /// Value sent in the `Accept-Charset` header of every request.
    ///
    /// The charset is advertised without a `q` parameter, which carries the
    /// maximum preference weight of 1.
    pub fn accept_charset(&self) -> &HeaderValue {
        &self.accept_charset
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }
}

/// Builds a fresh [`ClientHandle`] for a key.
///
/// Implementations only build and return; they must not touch any cache.
pub trait ClientBuilder: Send + Sync {
    fn build(&self, properties: &ClientProperties) -> Result<ClientHandle, ClientError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpClientBuilder {
    options: ClientOptions,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ClientOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

impl ClientBuilder for HttpClientBuilder {
    fn build(&self, properties: &ClientProperties) -> Result<ClientHandle, ClientError> {
        let accept_charset = HeaderValue::from_str(properties.charset().name())?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_CHARSET, accept_charset.clone());
        if let Some(credentials) = properties.credentials() {
            headers.insert(AUTHORIZATION, basic_authorization(credentials)?);
        }

        let mut builder = Client::builder()
            .user_agent(self.options.user_agent.as_str())
            .default_headers(headers);
        if let Some(secs) = self.options.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        debug!(
            charset = %properties.charset(),
            authenticated = properties.credentials().is_some(),
            "built HTTP client"
        );

        Ok(ClientHandle {
            client,
            properties: properties.clone(),
            accept_charset,
        })
    }
}

// RFC 7617 Basic scheme; the header is marked sensitive so it stays out of logs.
fn basic_authorization(credentials: &Credentials) -> Result<HeaderValue, ClientError> {
    let encoded = general_purpose::STANDARD.encode(format!(
        "{}:{}",
        credentials.username(),
        credentials.password()
    ));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))?;
    value.set_sensitive(true);
    Ok(value)
}
