use std::net::SocketAddr;

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    /// External base URL used when generating retrieval locators
    pub external_url: Url,
    /// Base address of the trust gateway key directory
    pub trust_gateway: Url,
    // log level for http tracing
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(
        listen_addr: SocketAddr,
        external_url: Option<Url>,
        trust_gateway: Url,
    ) -> Result<Self, ConfigError> {
        let external_url = match external_url {
            Some(url) => url,
            None => Url::parse(&format!("http://localhost:{}", listen_addr.port()))?,
        };
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, external_url={}, trust_gateway={}",
            listen_addr,
            external_url,
            trust_gateway
        );
        Ok(Self {
            listen_addr,
            external_url,
            trust_gateway,
            log_level: tracing::Level::INFO,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid Socket Address: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
}
