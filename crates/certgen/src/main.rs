//! Self-signed certificate generator
//!
//! Writes `cert.pem` and `key.pem` for the static HTTPS server, overwriting
//! any previous pair.

use clap::Parser;
use common::{CertConfig, generate_self_signed_cert};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;

/// Generate a self-signed RSA certificate for local HTTPS serving
#[derive(Debug, Parser)]
#[command(name = "certgen")]
struct CliArgs {
    /// LAN address used as the common name and last SAN entry
    #[arg(long, default_value_t = common::config::DEFAULT_LOCAL_IP)]
    ip: IpAddr,
    /// Output path of the PEM certificate
    #[arg(long, default_value = common::config::CERT_FILE)]
    cert: PathBuf,
    /// Output path of the PEM private key
    #[arg(long, default_value = common::config::KEY_FILE)]
    key: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = CliArgs::parse();
    let config = CertConfig::default()
        .with_local_ip(args.ip)
        .with_cert_path(args.cert)
        .with_key_path(args.key);

    info!(
        "Generating {}-bit RSA certificate for {}",
        config.key_bits, config.common_name
    );

    let cert = generate_self_signed_cert(&config)?;
    cert.write_pem_files(&config.cert_path, &config.key_path)?;

    println!(
        "Certificate and key files have been generated: {}, {}",
        config.cert_path.display(),
        config.key_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_fixed_literals() {
        let args = CliArgs::parse_from(["certgen"]);
        assert_eq!(args.ip.to_string(), "192.168.0.100");
        assert_eq!(args.cert, PathBuf::from("cert.pem"));
        assert_eq!(args.key, PathBuf::from("key.pem"));
    }

    #[test]
    fn ip_flag_accepts_ipv6() {
        let args = CliArgs::parse_from(["certgen", "--ip", "fe80::1"]);
        assert_eq!(args.ip, "fe80::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn rejects_non_ip_address() {
        assert!(CliArgs::try_parse_from(["certgen", "--ip", "my-laptop"]).is_err());
    }
}
