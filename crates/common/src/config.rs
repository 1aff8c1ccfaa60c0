//! Configuration types for the certificate generator and the server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default address of the machine on the local network.
pub const DEFAULT_LOCAL_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 0, 100));

/// Default certificate file name, shared by the generator and the server.
pub const CERT_FILE: &str = "cert.pem";

/// Default private key file name, shared by the generator and the server.
pub const KEY_FILE: &str = "key.pem";

/// Certificate generation options.
#[derive(Debug, Clone)]
pub struct CertConfig {
    /// Subject (and issuer) common name.
    pub common_name: String,
    /// DNS entries of the Subject Alternative Name extension.
    pub dns_names: Vec<String>,
    /// IP entries of the Subject Alternative Name extension, after the DNS names.
    pub ip_addresses: Vec<IpAddr>,
    /// Certificate serial number.
    pub serial: u64,
    /// Days between notBefore and notAfter.
    pub validity_days: i64,
    /// RSA modulus size in bits.
    pub key_bits: usize,
    /// Where the PEM certificate is written.
    pub cert_path: PathBuf,
    /// Where the PEM private key is written.
    pub key_path: PathBuf,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self {
            common_name: DEFAULT_LOCAL_IP.to_string(),
            dns_names: vec!["localhost".to_string()],
            ip_addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_LOCAL_IP],
            serial: 1000,
            validity_days: 365,
            key_bits: 2048,
            cert_path: PathBuf::from(CERT_FILE),
            key_path: PathBuf::from(KEY_FILE),
        }
    }
}

impl CertConfig {
    /// Use `ip` as the common name and as the last SAN entry, replacing the default LAN address.
    pub fn with_local_ip(mut self, ip: IpAddr) -> Self {
        self.common_name = ip.to_string();
        self.ip_addresses = vec![IpAddr::V4(Ipv4Addr::LOCALHOST), ip];
        self
    }

    pub fn with_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_path = path.into();
        self
    }

    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = path.into();
        self
    }
}

/// Server configuration options.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
    /// Directory files are served from.
    pub root: PathBuf,
    /// PEM certificate chain presented to clients.
    pub cert_path: PathBuf,
    /// PEM private key matching the certificate.
    pub key_path: PathBuf,
    /// Keep connections open between requests.
    pub keep_alive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000),
            root: PathBuf::from("."),
            cert_path: PathBuf::from(CERT_FILE),
            key_path: PathBuf::from(KEY_FILE),
            keep_alive: false,
        }
    }
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_tls_files(
        mut self,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        self.cert_path = cert_path.into();
        self.key_path = key_path.into();
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
