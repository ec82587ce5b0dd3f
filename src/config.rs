//! Service configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::notify::NotifierConfig;

/// Configuration for the status service
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Directory holding `index.html` and the JSON slot files
    pub base_dir: PathBuf,

    /// Address to listen on
    pub host: IpAddr,

    /// Port to listen on
    pub port: u16,

    /// Outbound messaging client
    pub notifier: NotifierConfig,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join("index.html")
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8686,
            notifier: NotifierConfig::default(),
        }
    }
}
