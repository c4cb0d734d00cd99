//! Proxy selection for crawl requests.
//!
//! Every crawl picks one proxy uniformly at random from the list supplied
//! with the request. Entries are free-form strings as users type them
//! (`localhost:8080`, `socks5://10.0.0.1:1080`) and are normalized into a
//! [`ProxyConfig`] before a transport is built from them.

use std::fmt;

use reqwest::Proxy as ReqwestProxy;
use tracing::debug;

use crate::{CrawlerError, Result};

/// Proxy protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyProtocol {
    /// HTTP proxy
    #[default]
    Http,
    /// HTTPS proxy
    Https,
    /// SOCKS5 proxy
    Socks5,
}

impl ProxyProtocol {
    fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks5 => "socks5",
        }
    }

    fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
            Self::Socks5 => 1080,
        }
    }
}

/// A single proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy host (IP or domain)
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Proxy protocol
    pub protocol: ProxyProtocol,
    /// Optional username for authentication
    pub username: Option<String>,
    /// Optional password for authentication
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Creates a new proxy configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: ProxyProtocol::Http,
            username: None,
            password: None,
        }
    }

    /// Sets the proxy protocol.
    pub fn with_protocol(mut self, protocol: ProxyProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets a username without a password.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = None;
        self
    }

    /// Sets authentication credentials.
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Parses a proxy entry as supplied by a crawl request.
    ///
    /// Entries without a scheme are treated as plain HTTP proxies, so
    /// `localhost:8080` routes through `http://localhost:8080`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };

        let url = url::Url::parse(&with_scheme)
            .map_err(|e| CrawlerError::InvalidProxy(format!("{}: {}", raw, e)))?;

        let protocol = match url.scheme() {
            "http" => ProxyProtocol::Http,
            "https" => ProxyProtocol::Https,
            "socks5" => ProxyProtocol::Socks5,
            _ => return Err(CrawlerError::InvalidProxy(raw.to_string())),
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CrawlerError::InvalidProxy(raw.to_string()))?;
        let port = url.port().unwrap_or(protocol.default_port());

        let mut config = ProxyConfig::new(host, port).with_protocol(protocol);
        match (url.username(), url.password()) {
            ("", None) => {}
            (username, Some(password)) => config = config.with_auth(username, password),
            (username, None) => config = config.with_username(username),
        }

        Ok(config)
    }

    /// Returns the proxy URL string.
    pub fn url(&self) -> String {
        let scheme = self.protocol.scheme();
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => {
                format!("{}://{}:{}@{}:{}", scheme, user, pass, self.host, self.port)
            }
            (Some(user), None) => format!("{}://{}@{}:{}", scheme, user, self.host, self.port),
            _ => format!("{}://{}:{}", scheme, self.host, self.port),
        }
    }

    /// Builds a reqwest proxy routing every scheme through this entry.
    pub fn to_reqwest(&self) -> Result<ReqwestProxy> {
        ReqwestProxy::all(self.url())
            .map_err(|e| CrawlerError::InvalidProxy(format!("{}: {}", self.url(), e)))
    }
}

/// Credentials are left out so the value can be logged.
impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}

/// Parses every entry of a request's proxy list.
///
/// One bad entry rejects the whole list, whichever entry would be picked.
pub fn parse_proxies(raw: &[String]) -> Result<Vec<ProxyConfig>> {
    raw.iter().map(|entry| ProxyConfig::parse(entry)).collect()
}

/// Picks one proxy uniformly at random.
///
/// Fails with [`CrawlerError::EmptyProxyList`] when there is nothing to pick.
pub fn choose_proxy<T: fmt::Display>(proxies: &[T]) -> Result<&T> {
    if proxies.is_empty() {
        return Err(CrawlerError::EmptyProxyList);
    }

    let index = rand::random_range(0..proxies.len());
    let proxy = &proxies[index];
    debug!("Selected proxy {} of {}: {}", index + 1, proxies.len(), proxy);
    Ok(proxy)
}
