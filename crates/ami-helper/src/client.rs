//! AMI client handle
//!
//! [`AmiClient`] is the one seam to the remote service: hand it a rendered
//! command, get back the decoded response body. [`HttpClient`] is the real
//! implementation, talking HTTPS to the AMI front-end with the user's grid
//! proxy as the TLS identity. Closures implement the trait too, which is
//! what the tests use.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::{Certificate, Identity, StatusCode};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use ami_helper_core::Config;

/// Asks the front-end to answer in JSON rather than XML
const JSON_CONVERTER: &str = "AMIXmlToJson.xsl";

/// Failures of the remote call itself
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("AMI request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AMI returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AMI reported an error: {0}")]
    Service(String),
}

/// Anything that can run an AMI command
pub trait AmiClient {
    /// Submit a command and return the decoded response body.
    ///
    /// A missing body comes back as `Value::Null`; a body that is not JSON
    /// comes back as `Value::String`. Judging the shape is the caller's job.
    fn execute(&self, command: &str) -> Result<Value, TransportError>;
}

impl<F> AmiClient for F
where
    F: Fn(&str) -> Result<Value, TransportError>,
{
    fn execute(&self, command: &str) -> Result<Value, TransportError> {
        self(command)
    }
}

/// Blocking HTTPS client for the AMI front-end
pub struct HttpClient {
    endpoint: String,
    http: Client,
}

impl HttpClient {
    /// Build a client authenticated with the configured grid proxy
    pub fn new(config: &Config) -> Result<Self> {
        let pem = fs::read(&config.x509_user_proxy).with_context(|| {
            format!(
                "Failed to read grid proxy {:?} - run voms-proxy-init first",
                config.x509_user_proxy
            )
        })?;
        let identity = Identity::from_pem(&pem)
            .with_context(|| format!("Invalid grid proxy {:?}", config.x509_user_proxy))?;

        let mut builder = Client::builder().identity(identity);

        if config.x509_cert_dir.is_dir() {
            for path in ca_files(&config.x509_cert_dir) {
                match load_certificate(&path) {
                    Ok(cert) => builder = builder.add_root_certificate(cert),
                    Err(e) => debug!("Skipping CA file {}: {:#}", path.display(), e),
                }
            }
        } else {
            warn!(
                "CA directory {} not found, using built-in roots only",
                config.x509_cert_dir.display()
            );
        }

        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AmiClient for HttpClient {
    fn execute(&self, command: &str) -> Result<Value, TransportError> {
        debug!("POST {}", self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("Command", command), ("Converter", JSON_CONVERTER)])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        decode_response(status, body)
    }
}

/// Map a finished HTTP exchange to the decoded body or a status error
fn decode_response(status: StatusCode, body: String) -> Result<Value, TransportError> {
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(parse_body(&body))
}

/// Decode a response body without judging its shape
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Certificate files in a grid CA directory (`*.pem` and hash links `*.0`)
fn ca_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() || e.path_is_symlink())
        .map(|e| e.into_path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("pem") | Some("0")))
        .collect();
    files.sort();
    files
}

fn load_certificate(path: &Path) -> Result<Certificate> {
    let pem = fs::read(path)?;
    Ok(Certificate::from_pem(&pem)?)
}
