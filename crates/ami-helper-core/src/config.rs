//! Configuration loading for ami-helper
//!
//! Values come from three layers, later ones winning: built-in defaults,
//! `config.toml` in the ami-helper config directory, and the environment
//! variables the grid tooling already exports (`X509_USER_PROXY`,
//! `X509_CERT_DIR`) plus `AMI_ENDPOINT`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::Paths;

/// Default AMI front-end (the CERN replica)
pub const DEFAULT_ENDPOINT: &str = "https://atlas-ami.cern.ch/AMI2/FrontEnd";

/// Grid CA certificates as distributed on CVMFS
pub const DEFAULT_CERT_DIR: &str =
    "/cvmfs/atlas.cern.ch/repo/ATLASLocalRootBase/etc/grid-security-emi/certificates";

/// ami-helper configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// AMI front-end URL
    pub endpoint: String,

    /// X.509 proxy (certificate and key PEM) used as the TLS identity
    pub x509_user_proxy: PathBuf,

    /// Directory of trusted grid CA certificates
    pub x509_cert_dir: PathBuf,
}

/// On-disk form; every key is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    endpoint: Option<String>,
    x509_user_proxy: Option<PathBuf>,
    x509_cert_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            x509_user_proxy: default_proxy_path(),
            x509_cert_dir: PathBuf::from(DEFAULT_CERT_DIR),
        }
    }
}

/// `voms-proxy-init` writes the proxy to /tmp/x509up_u<uid>
fn default_proxy_path() -> PathBuf {
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/x509up_u{}", uid))
}

impl Config {
    /// Load configuration from the standard location and the environment
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Paths::new().config_file())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file, falling back to defaults
    /// when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();

        if !path.exists() {
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let file: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;

        if let Some(endpoint) = file.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(proxy) = file.x509_user_proxy {
            config.x509_user_proxy = proxy;
        }
        if let Some(cert_dir) = file.x509_cert_dir {
            config.x509_cert_dir = cert_dir;
        }

        Ok(config)
    }

    /// Override fields from environment variables, looked up through `var`
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = var("AMI_ENDPOINT").filter(|v| !v.is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(proxy) = var("X509_USER_PROXY").filter(|v| !v.is_empty()) {
            self.x509_user_proxy = PathBuf::from(proxy);
        }
        if let Some(cert_dir) = var("X509_CERT_DIR").filter(|v| !v.is_empty()) {
            self.x509_cert_dir = PathBuf::from(cert_dir);
        }
    }
}
