//! Process-wide cache of reusable HTTP clients.
//!
//! A [`ClientCache`] maps each distinct [`ClientProperties`] (credentials plus
//! accepted charset) to one shared [`ClientHandle`], built on first request and
//! kept until the process exits. [`WebClientFactory`] wraps a cache and sets up
//! the certificate trust policy once when it is constructed.

pub mod cache;
pub mod client;
pub mod config;
pub mod factory;
pub mod key;
pub mod trust;

pub use cache::ClientCache;
pub use client::{ClientBuilder, ClientError, ClientHandle, ClientOptions, HttpClientBuilder};
pub use config::{allowed_thumbprints, ConfigError, ConfigManager, ConfigSource, TomlConfig};
pub use factory::{FactoryError, WebClientFactory};
pub use key::{Charset, ClientProperties, Credentials, KeyError};
pub use trust::{ThumbprintPolicy, TrustError, TrustInitializer};
