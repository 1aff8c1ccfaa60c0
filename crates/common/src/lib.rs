//! Common utilities shared between the certificate generator and the HTTPS server.
//!
//! This crate provides:
//! - Self-signed RSA certificate generation
//! - PEM loading and rustls server configuration
//! - Configuration types

pub mod config;
pub mod tls;

pub use config::{CertConfig, ServerConfig};
pub use tls::{CertificateChain, GeneratedCert, generate_self_signed_cert};
