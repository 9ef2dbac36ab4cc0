//! Bitmovin REST client.
//!
//! Features:
//! - `X-Api-Key` authentication, plus `X-Tenant-Org-Id` when an organization
//!   is configured.
//! - Token-bucket rate limiting via [`governor`].
//! - Per-request timeout.
//! - Envelope decoding: successful responses carry `data.result`, failures
//!   carry `data.code` and `data.message`.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use orchestrator_common::{Error, RemoteContext, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::RequestBuilder;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::api::{
    AudioCodec, AudioConfig, BitmovinApi, EncodingStatus, HttpInput, NewEncoding, NewMuxing,
    NewStream, VideoCodec, VideoConfig,
};
use crate::config::BitmovinConfig;
use crate::provider::enrichment::{Muxing, MuxingInformation, MuxingKind, MuxingSource, VideoTrack};
use crate::provider::pagination::Page;

/// Failure talking to the Bitmovin API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}{}: {message}", code_suffix(.code))]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

impl ApiError {
    fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }
}

fn not_found_or_remote(e: ApiError, entity: &str, id: &str, context: &str) -> Error {
    if e.is_not_found() {
        Error::not_found(entity, id)
    } else {
        Error::remote(context, e)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeData {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    developer_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdResult {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationResult<T> {
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MuxingItem {
    id: String,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MuxingInformationResult {
    #[serde(default)]
    container_format: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    video_tracks: Option<Vec<VideoTrackResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoTrackResult {
    #[serde(default)]
    codec: Option<String>,
    #[serde(default)]
    frame_width: Option<u32>,
    #[serde(default)]
    frame_height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TaskMessage {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// [`BitmovinApi`] over HTTP.
pub struct HttpBitmovinApi {
    client: reqwest::Client,
    endpoint: String,
    rate_limiter: DirectLimiter,
}

impl HttpBitmovinApi {
    /// Build a client from validated configuration.
    pub fn new(config: &BitmovinConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| Error::configuration("bitmovin", format!("api_key: {e}")))?;
        headers.insert("X-Api-Key", api_key);
        if let Some(org) = config.organization_id.as_deref().filter(|o| !o.is_empty()) {
            let org = HeaderValue::from_str(org)
                .map_err(|e| Error::configuration("bitmovin", format!("organization_id: {e}")))?;
            headers.insert("X-Tenant-Org-Id", org);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::configuration("bitmovin", format!("building HTTP client: {e}")))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Send a request and decode `data.result` into `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> std::result::Result<T, ApiError> {
        self.rate_limiter.until_ready().await;

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let envelope: Option<Envelope> = serde_json::from_str(&body).ok();

        let failed = !status.is_success()
            || envelope
                .as_ref()
                .is_some_and(|e| e.status.eq_ignore_ascii_case("ERROR"));
        if failed {
            let data = envelope.and_then(|e| e.data);
            let code = data.as_ref().and_then(|d| d.code);
            let message = data
                .and_then(|d| d.message.or(d.developer_message))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let result = envelope
            .and_then(|e| e.data)
            .and_then(|d| d.result)
            .unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_for_id<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> std::result::Result<String, ApiError> {
        debug!(path, "bitmovin POST");
        let result: IdResult = self.send(self.client.post(self.url(path)).json(body)).await?;
        Ok(result.id)
    }

    async fn delete(&self, path: &str) -> std::result::Result<(), ApiError> {
        debug!(path, "bitmovin DELETE");
        self.send::<IgnoredAny>(self.client.delete(self.url(path))).await?;
        Ok(())
    }
}

#[async_trait]
impl MuxingSource for HttpBitmovinApi {
    async fn list_muxings(
        &self,
        job_id: &str,
        kind: MuxingKind,
        offset: u64,
        limit: u32,
    ) -> Result<Page<Muxing>> {
        let path = format!("/encoding/encodings/{job_id}/muxings/{}", kind.path_segment());
        let request = self
            .client
            .get(self.url(&path))
            .query(&[("offset", offset.to_string()), ("limit", limit.to_string())]);
        let page: PaginationResult<MuxingItem> = self
            .send(request)
            .await
            .with_remote_context(|| format!("listing {} of encoding {job_id:?}", kind.label()))?;

        let items: Vec<Muxing> = page
            .items
            .into_iter()
            .map(|m| Muxing {
                id: m.id,
                filename: m.filename.unwrap_or_default(),
            })
            .collect();
        let total_count = page.total_count.unwrap_or(offset + items.len() as u64);
        Ok(Page { items, total_count })
    }

    async fn muxing_information(
        &self,
        job_id: &str,
        kind: MuxingKind,
        muxing_id: &str,
    ) -> Result<MuxingInformation> {
        let path = format!(
            "/encoding/encodings/{job_id}/muxings/{}/{muxing_id}/information",
            kind.path_segment()
        );
        let info: MuxingInformationResult = self
            .send(self.client.get(self.url(&path)))
            .await
            .with_remote_context(|| format!("GET {path}"))?;

        Ok(MuxingInformation {
            container_format: info.container_format,
            file_size: info.file_size,
            video_tracks: info
                .video_tracks
                .unwrap_or_default()
                .into_iter()
                .map(|t| VideoTrack {
                    codec: t.codec,
                    frame_width: t.frame_width,
                    frame_height: t.frame_height,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl BitmovinApi for HttpBitmovinApi {
    async fn create_video_config(&self, codec: VideoCodec, config: &VideoConfig) -> Result<String> {
        self.post_for_id(&format!("/encoding/configurations/video/{}", codec.as_str()), config)
            .await
            .remote_context("creating the video config")
    }

    async fn delete_video_config(&self, codec: VideoCodec, id: &str) -> Result<()> {
        self.delete(&format!("/encoding/configurations/video/{}/{id}", codec.as_str()))
            .await
            .map_err(|e| not_found_or_remote(e, "video config", id, "removing the video config"))
    }

    async fn create_audio_config(&self, codec: AudioCodec, config: &AudioConfig) -> Result<String> {
        self.post_for_id(&format!("/encoding/configurations/audio/{}", codec.as_str()), config)
            .await
            .remote_context("creating the audio config")
    }

    async fn delete_audio_config(&self, codec: AudioCodec, id: &str) -> Result<()> {
        self.delete(&format!("/encoding/configurations/audio/{}/{id}", codec.as_str()))
            .await
            .map_err(|e| not_found_or_remote(e, "audio config", id, "removing the audio config"))
    }

    async fn create_input(&self, input: &HttpInput) -> Result<String> {
        let scheme = if input.secure { "https" } else { "http" };
        self.post_for_id(&format!("/encoding/inputs/{scheme}"), input)
            .await
            .remote_context("creating the input")
    }

    async fn create_encoding(&self, encoding: &NewEncoding) -> Result<String> {
        self.post_for_id("/encoding/encodings", encoding)
            .await
            .remote_context("creating the encoding")
    }

    async fn create_stream(&self, encoding_id: &str, stream: &NewStream) -> Result<String> {
        self.post_for_id(&format!("/encoding/encodings/{encoding_id}/streams"), stream)
            .await
            .remote_context("creating the stream")
    }

    async fn create_muxing(
        &self,
        encoding_id: &str,
        kind: MuxingKind,
        muxing: &NewMuxing,
    ) -> Result<String> {
        self.post_for_id(
            &format!("/encoding/encodings/{encoding_id}/muxings/{}", kind.path_segment()),
            muxing,
        )
        .await
        .with_remote_context(|| format!("creating the {} muxing", kind.path_segment()))
    }

    async fn start_encoding(&self, encoding_id: &str) -> Result<()> {
        let request = self
            .client
            .post(self.url(&format!("/encoding/encodings/{encoding_id}/start")))
            .json(&serde_json::json!({}));
        self.send::<IgnoredAny>(request)
            .await
            .map(|_| ())
            .remote_context("starting the encoding")
    }

    async fn stop_encoding(&self, encoding_id: &str) -> Result<()> {
        let request = self
            .client
            .post(self.url(&format!("/encoding/encodings/{encoding_id}/stop")));
        self.send::<IgnoredAny>(request)
            .await
            .map(|_| ())
            .map_err(|e| not_found_or_remote(e, "job", encoding_id, "stopping the encoding"))
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<EncodingStatus> {
        let request = self
            .client
            .get(self.url(&format!("/encoding/encodings/{encoding_id}/status")));
        let raw: serde_json::Map<String, Value> = self.send(request).await.map_err(|e| {
            not_found_or_remote(e, "job", encoding_id, "retrieving the encoding status")
        })?;

        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let error_message = raw
            .get("messages")
            .cloned()
            .and_then(|m| serde_json::from_value::<Vec<TaskMessage>>(m).ok())
            .and_then(|messages| {
                messages
                    .into_iter()
                    .find(|m| m.kind.eq_ignore_ascii_case("ERROR"))
                    .map(|m| m.text)
            });

        Ok(EncodingStatus {
            status,
            error_message,
            raw,
        })
    }

    async fn account_information(&self) -> Result<()> {
        let request = self.client.get(self.url("/account/information"));
        match self.send::<IgnoredAny>(request).await {
            Ok(_) => Ok(()),
            Err(ApiError::Api {
                status: 401 | 403,
                message,
                ..
            }) => Err(Error::Unhealthy(format!("bitmovin rejected the API key: {message}"))),
            Err(e) => Err(Error::remote("retrieving account information", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> HttpBitmovinApi {
        HttpBitmovinApi::new(&BitmovinConfig {
            api_key: "test-key".into(),
            organization_id: Some("org-1".into()),
            endpoint: server.uri(),
            output_id: "out-1".into(),
            destination: "s3://bucket/".into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "requestId": "req-1",
            "status": "SUCCESS",
            "data": { "result": result }
        }))
    }

    fn error(status: u16, code: i64, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_json(json!({
            "requestId": "req-1",
            "status": "ERROR",
            "data": { "code": code, "message": message }
        }))
    }

    #[tokio::test]
    async fn create_video_config_sends_auth_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/encoding/configurations/video/h264"))
            .and(header("X-Api-Key", "test-key"))
            .and(header("X-Tenant-Org-Id", "org-1"))
            .and(body_partial_json(json!({"name": "mp4_1080p", "height": 1080})))
            .respond_with(ok(json!({"id": "video-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = api(&server)
            .create_video_config(
                VideoCodec::H264,
                &VideoConfig {
                    name: "mp4_1080p".into(),
                    height: Some(1080),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(id, "video-1");
    }

    #[tokio::test]
    async fn api_error_is_wrapped_with_operation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/encoding/configurations/video/vp8"))
            .respond_with(error(400, 1001, "bitrate is out of range"))
            .mount(&server)
            .await;

        let err = api(&server)
            .create_video_config(VideoCodec::Vp8, &VideoConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
        assert_eq!(
            err.to_string(),
            "creating the video config: HTTP 400 (code 1001): bitrate is out of range"
        );
    }

    #[tokio::test]
    async fn delete_audio_config() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/encoding/configurations/audio/aac/audio-1"))
            .respond_with(ok(json!({"id": "audio-1"})))
            .expect(1)
            .mount(&server)
            .await;

        api(&server)
            .delete_audio_config(AudioCodec::Aac, "audio-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deleting_missing_config_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/encoding/configurations/video/h264/gone"))
            .respond_with(error(404, 1000, "not found"))
            .mount(&server)
            .await;

        let err = api(&server)
            .delete_video_config(VideoCodec::H264, "gone")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "video config not found: gone");
    }

    #[tokio::test]
    async fn lists_muxings_with_offset_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encoding/encodings/enc-1/muxings/progressive-webm"))
            .and(query_param("offset", "100"))
            .and(query_param("limit", "100"))
            .respond_with(ok(json!({
                "totalCount": 101,
                "offset": 100,
                "limit": 100,
                "items": [{"id": "mux-101", "filename": "webm_720p/video.webm"}]
            })))
            .mount(&server)
            .await;

        let page = api(&server)
            .list_muxings("enc-1", MuxingKind::ProgressiveWebm, 100, 100)
            .await
            .unwrap();
        assert_eq!(page.total_count, 101);
        assert_eq!(
            page.items,
            vec![Muxing {
                id: "mux-101".into(),
                filename: "webm_720p/video.webm".into()
            }]
        );
    }

    #[tokio::test]
    async fn muxing_information_with_null_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encoding/encodings/enc-1/muxings/mp4/mux-1/information"))
            .respond_with(ok(json!({
                "containerFormat": "mp4",
                "fileSize": null,
                "videoTracks": [{"codec": "h264", "frameWidth": 1280, "frameHeight": null}]
            })))
            .mount(&server)
            .await;

        let info = api(&server)
            .muxing_information("enc-1", MuxingKind::Mp4, "mux-1")
            .await
            .unwrap();
        assert_eq!(info.container_format.as_deref(), Some("mp4"));
        assert_eq!(info.file_size, None);
        assert_eq!(info.video_tracks[0].frame_width, Some(1280));
        assert_eq!(info.video_tracks[0].frame_height, None);
    }

    #[tokio::test]
    async fn encoding_status_keeps_raw_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encoding/encodings/enc-1/status"))
            .respond_with(ok(json!({
                "status": "ERROR",
                "progress": 42,
                "messages": [
                    {"type": "INFO", "text": "started"},
                    {"type": "ERROR", "text": "input not reachable"}
                ],
                "createdAt": "2024-03-01T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let status = api(&server).encoding_status("enc-1").await.unwrap();
        assert_eq!(status.status, "ERROR");
        assert_eq!(status.error_message.as_deref(), Some("input not reachable"));
        assert_eq!(status.raw["progress"], 42);
        assert_eq!(status.raw["createdAt"], "2024-03-01T10:00:00Z");
    }

    #[tokio::test]
    async fn unknown_encoding_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encoding/encodings/missing/status"))
            .respond_with(error(404, 1000, "encoding not found"))
            .mount(&server)
            .await;

        let err = api(&server).encoding_status("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn rejected_key_is_unhealthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account/information"))
            .respond_with(error(401, 1002, "invalid api key"))
            .mount(&server)
            .await;

        let err = api(&server).account_information().await.unwrap_err();
        assert!(matches!(err, Error::Unhealthy(_)));
    }

    #[tokio::test]
    async fn non_json_failure_uses_http_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/encoding/encodings"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = api(&server)
            .create_encoding(&NewEncoding {
                name: "job".into(),
                cloud_region: "AUTO".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "creating the encoding: HTTP 502: Bad Gateway");
    }

    #[test]
    fn invalid_api_key_is_configuration_error() {
        let config = BitmovinConfig {
            api_key: "bad\nkey".into(),
            ..Default::default()
        };
        assert!(matches!(
            HttpBitmovinApi::new(&config),
            Err(Error::Configuration { .. })
        ));
    }
}
