use super::types::LabCatalog;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration for the lab orchestrator.
///
/// All values can be supplied as command-line arguments or through the
/// corresponding `LABRANGE_*` environment variables; defaults match the
/// single-host deployment the platform targets.
#[derive(Parser, Debug, Clone)]
#[command(name = "labrange")]
#[command(version)]
#[command(about = "Per-user vulnerability-lab container orchestrator")]
pub struct Config {
    /// Socket address the HTTP API binds to.
    ///
    /// # Command Line
    /// Use `--bind-address <ADDR:PORT>` to set this value from the CLI
    #[arg(long, env = "LABRANGE_BIND", default_value = "127.0.0.1:8080")]
    pub bind_address: SocketAddr,

    /// Path of the SQLite database holding active session records.
    ///
    /// The file and its parent directory are created on first use.
    ///
    /// # Command Line
    /// Use `--database-path <PATH>` to set this value from the CLI
    #[arg(long, env = "LABRANGE_DB", default_value = "labrange.sqlite3")]
    pub database_path: PathBuf,

    /// Lowest host port handed out to lab containers.
    ///
    /// Ports are allocated upwards from this base against the set of
    /// ports already held by tracked sessions.
    ///
    /// # Command Line
    /// Use `--base-port <PORT>` to set this value from the CLI
    #[arg(long, env = "LABRANGE_BASE_PORT", default_value_t = 3001)]
    pub base_port: u16,

    /// Container image backing the XSS lab.
    #[arg(long, env = "LABRANGE_XSS_IMAGE", default_value = "xss_lab")]
    pub xss_image: String,

    /// Container image backing the CSRF lab.
    #[arg(long, env = "LABRANGE_CSRF_IMAGE", default_value = "csrf_lab")]
    pub csrf_image: String,

    /// Stop and remove every managed lab container, clear all persisted
    /// session records, then exit without serving.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub purge: bool,
}

impl Config {
    pub fn from_args() -> Self {
        Config::parse()
    }

    pub fn lab_catalog(&self) -> LabCatalog {
        LabCatalog::new(self.xss_image.clone(), self.csrf_image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::LabType;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("labrange").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap_or_else(|e| panic!("{}", e));
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.base_port, 3001);
        assert_eq!(config.database_path, PathBuf::from("labrange.sqlite3"));
        assert!(!config.purge);

        let catalog = config.lab_catalog();
        assert_eq!(catalog.image_for(LabType::Xss), "xss_lab");
        assert_eq!(catalog.image_for(LabType::Csrf), "csrf_lab");
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--bind-address",
            "0.0.0.0:9000",
            "--base-port",
            "4000",
            "--xss-image",
            "labs/xss:v2",
            "--purge",
        ])
        .unwrap_or_else(|e| panic!("{}", e));

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:9000");
        assert_eq!(config.base_port, 4000);
        assert!(config.purge);
        assert_eq!(config.lab_catalog().image_for(LabType::Xss), "labs/xss:v2");
        assert_eq!(config.lab_catalog().image_for(LabType::Csrf), "csrf_lab");
    }

    #[test]
    fn test_invalid_bind_address_rejected() {
        assert!(parse(&["--bind-address", "not-an-addr"]).is_err());
    }
}
