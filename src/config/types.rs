use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Bitmovin credentials and output settings. Absent = provider disabled.
    #[serde(default)]
    pub bitmovin: Option<BitmovinConfig>,

    /// Encoding.com credentials and output settings. Absent = provider disabled.
    #[serde(default)]
    pub encodingcom: Option<EncodingComConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Overall deadline for one provider operation, in seconds
    #[serde(default = "default_request_deadline")]
    pub request_deadline_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_deadline() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_deadline_secs: default_request_deadline(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("transcode-orchestrator.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BitmovinConfig {
    #[serde(default)]
    pub api_key: String,

    /// Sent as `X-Tenant-Org-Id` when set
    #[serde(default)]
    pub organization_id: Option<String>,

    #[serde(default = "default_bitmovin_endpoint")]
    pub endpoint: String,

    /// ID of a pre-registered Bitmovin output (bucket) that receives results
    #[serde(default)]
    pub output_id: String,

    /// Public root URL of that output, e.g. `s3://bucket/encodes`
    #[serde(default)]
    pub destination: String,

    #[serde(default = "default_cloud_region")]
    pub cloud_region: String,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Page size used when listing muxings (Bitmovin caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_http_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bitmovin_endpoint() -> String {
    "https://api.bitmovin.com/v1".to_string()
}
fn default_cloud_region() -> String {
    "AUTO".to_string()
}
fn default_requests_per_second() -> u32 {
    10
}
fn default_page_size() -> u32 {
    crate::provider::pagination::DEFAULT_PAGE_SIZE
}
fn default_http_timeout() -> u64 {
    30
}

impl Default for BitmovinConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization_id: None,
            endpoint: default_bitmovin_endpoint(),
            output_id: String::new(),
            destination: String::new(),
            cloud_region: default_cloud_region(),
            requests_per_second: default_requests_per_second(),
            page_size: default_page_size(),
            request_timeout_secs: default_http_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EncodingComConfig {
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub user_key: String,

    #[serde(default = "default_encodingcom_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_encodingcom_status_endpoint")]
    pub status_endpoint: String,

    /// Root URL outputs are written under, e.g. `https://bucket.s3.amazonaws.com/dest/`
    #[serde(default)]
    pub destination: String,

    /// Processing region hint passed with every `AddMedia`
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub request_timeout_secs: u64,
}

fn default_encodingcom_endpoint() -> String {
    "https://manage.encoding.com".to_string()
}
fn default_encodingcom_status_endpoint() -> String {
    "http://status.encoding.com".to_string()
}

impl Default for EncodingComConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            user_key: String::new(),
            endpoint: default_encodingcom_endpoint(),
            status_endpoint: default_encodingcom_status_endpoint(),
            destination: String::new(),
            region: None,
            request_timeout_secs: default_http_timeout(),
        }
    }
}
