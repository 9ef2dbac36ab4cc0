//! Encoding.com API client.
//!
//! Every action is a POST to one endpoint with a form field `json` holding
//! `{"query": {"userid", "userkey", "action", ...}}`. Replies arrive as
//! `{"response": {...}}`, with `response.errors.error` on failure. Service
//! health comes from a separate status page.

use std::time::Duration;

use async_trait::async_trait;
use orchestrator_common::{Error, RemoteContext, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::EncodingComConfig;

/// One output format of an `AddMedia` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaFormat {
    /// Saved preset or output name.
    pub output: Vec<String>,
    pub destination: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddedMedia {
    pub media_id: String,
    pub message: String,
}

/// Extended status of one media.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaStatus {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub progress: f64,
    #[serde(default)]
    pub sourcefile: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time_left: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub started: String,
    #[serde(default)]
    pub finished: String,
    /// Error text for failed media.
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "format", deserialize_with = "one_or_many")]
    pub formats: Vec<FormatStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FormatStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub output: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub destination: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub destination_status: Vec<String>,
}

/// Format stored by `SavePreset`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresetFormat {
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyframe: Option<String>,
}

/// Body of the status page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub incident: String,
}

#[async_trait]
pub trait EncodingComApi: Send + Sync {
    async fn add_media(
        &self,
        source: &[String],
        formats: &[MediaFormat],
        region: Option<&str>,
    ) -> Result<AddedMedia>;

    async fn media_status(&self, media_id: &str) -> Result<MediaStatus>;

    async fn cancel_media(&self, media_id: &str) -> Result<()>;

    /// Returns the name the preset was saved under.
    async fn save_preset(&self, name: &str, format: &PresetFormat) -> Result<String>;

    async fn delete_preset(&self, name: &str) -> Result<()>;

    async fn api_status(&self) -> Result<ApiStatus>;
}

/// Failure talking to Encoding.com.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Api(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api(message) if message.to_ascii_lowercase().contains("not found"))
    }
}

pub struct HttpEncodingComApi {
    client: reqwest::Client,
    endpoint: String,
    status_endpoint: String,
    user_id: String,
    user_key: String,
}

impl HttpEncodingComApi {
    pub fn new(config: &EncodingComConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::configuration("encodingcom", format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            status_endpoint: config.status_endpoint.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            user_key: config.user_key.clone(),
        })
    }

    /// Run `action` with extra query `fields` and decode `response` into `T`.
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        fields: Map<String, Value>,
    ) -> std::result::Result<T, ApiError> {
        let mut query = Map::new();
        query.insert("userid".into(), Value::from(self.user_id.as_str()));
        query.insert("userkey".into(), Value::from(self.user_key.as_str()));
        query.insert("action".into(), Value::from(action));
        query.extend(fields);
        let payload = json!({ "query": query }).to_string();

        debug!(action, "encoding.com request");
        let body = self
            .client
            .post(&self.endpoint)
            .form(&[("json", payload)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mut envelope: Value =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = envelope
            .get_mut("response")
            .map(Value::take)
            .ok_or_else(|| ApiError::Decode("missing \"response\"".into()))?;

        if let Some(errors) = response.get("errors") {
            return Err(ApiError::Api(error_text(errors)));
        }
        serde_json::from_value(response).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Flatten `errors.error`, which may be a string or a list of strings.
fn error_text(errors: &Value) -> String {
    match errors.get("error") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => errors.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct AddMediaReply {
    #[serde(default)]
    message: String,
    #[serde(rename = "MediaID")]
    media_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusReply {
    #[serde(deserialize_with = "one_or_many")]
    job: Vec<MediaStatus>,
}

#[derive(Debug, Deserialize)]
struct SavePresetReply {
    #[serde(rename = "SavedPreset")]
    saved_preset: String,
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl EncodingComApi for HttpEncodingComApi {
    async fn add_media(
        &self,
        source: &[String],
        formats: &[MediaFormat],
        region: Option<&str>,
    ) -> Result<AddedMedia> {
        let mut query = fields(json!({ "source": source, "format": formats }));
        if let Some(region) = region {
            query.insert("region".into(), Value::from(region));
        }
        let reply: AddMediaReply = self
            .call("AddMedia", query)
            .await
            .remote_context("adding the media")?;
        Ok(AddedMedia {
            media_id: reply.media_id,
            message: reply.message,
        })
    }

    async fn media_status(&self, media_id: &str) -> Result<MediaStatus> {
        let reply: StatusReply = self
            .call(
                "GetStatus",
                fields(json!({ "mediaid": media_id, "extended": "yes" })),
            )
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::not_found("job", media_id)
                } else {
                    Error::remote("retrieving the media status", e)
                }
            })?;
        reply
            .job
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("job", media_id))
    }

    async fn cancel_media(&self, media_id: &str) -> Result<()> {
        self.call::<Value>("CancelMedia", fields(json!({ "mediaid": media_id })))
            .await
            .map(|_| ())
            .map_err(|e| {
                if e.is_not_found() {
                    Error::not_found("job", media_id)
                } else {
                    Error::remote("canceling the media", e)
                }
            })
    }

    async fn save_preset(&self, name: &str, format: &PresetFormat) -> Result<String> {
        let reply: SavePresetReply = self
            .call(
                "SavePreset",
                fields(json!({ "name": name, "type": "user", "format": format })),
            )
            .await
            .remote_context("saving the preset")?;
        Ok(reply.saved_preset)
    }

    async fn delete_preset(&self, name: &str) -> Result<()> {
        self.call::<Value>("DeletePreset", fields(json!({ "name": name })))
            .await
            .map(|_| ())
            .map_err(|e| {
                if e.is_not_found() {
                    Error::not_found("encoding.com preset", name)
                } else {
                    Error::remote("deleting the preset", e)
                }
            })
    }

    async fn api_status(&self) -> Result<ApiStatus> {
        let url = format!("{}/status.php", self.status_endpoint);
        let request = self.client.get(url).query(&[("format", "json")]);
        async {
            let resp = request.send().await?.error_for_status()?;
            resp.json::<ApiStatus>().await
        }
        .await
        .remote_context("retrieving the encoding.com status")
    }
}

// Encoding.com returns single-element lists as bare values, and numbers as
// strings.

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
        Empty(()),
    }
    Ok(match OneOrMany::<T>::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
        OneOrMany::Empty(()) => Vec::new(),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
