//! In-memory [`BitmovinApi`] with call recording and failure injection.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use orchestrator_common::{Error, Result};
use parking_lot::Mutex;

use super::api::{
    AudioCodec, AudioConfig, BitmovinApi, EncodingStatus, HttpInput, NewEncoding, NewMuxing,
    NewStream, VideoCodec, VideoConfig,
};
use crate::provider::enrichment::{Muxing, MuxingInformation, MuxingKind, MuxingSource};
use crate::provider::pagination::Page;

#[derive(Default)]
pub struct FakeBitmovin {
    pub calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    next_id: Mutex<u32>,
    pub video_configs: Mutex<HashMap<String, (VideoCodec, VideoConfig)>>,
    pub audio_configs: Mutex<HashMap<String, (AudioCodec, AudioConfig)>>,
    pub inputs: Mutex<Vec<HttpInput>>,
    pub encodings: Mutex<Vec<(String, NewEncoding)>>,
    pub streams: Mutex<Vec<(String, NewStream)>>,
    pub muxings: Mutex<Vec<(String, MuxingKind, NewMuxing)>>,
    pub started: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<String>>,
    pub statuses: Mutex<HashMap<String, EncodingStatus>>,
    pub outputs: Mutex<HashMap<(String, MuxingKind), Vec<(Muxing, MuxingInformation)>>>,
}

impl FakeBitmovin {
    /// Make every later call to `operation` fail with a remote error.
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    pub fn called(&self, operation: &str) -> bool {
        self.calls.lock().iter().any(|c| c == operation)
    }

    pub fn set_status(&self, encoding_id: &str, status: EncodingStatus) {
        self.statuses.lock().insert(encoding_id.to_string(), status);
    }

    pub fn add_output(&self, encoding_id: &str, kind: MuxingKind, muxing: Muxing, info: MuxingInformation) {
        self.outputs
            .lock()
            .entry((encoding_id.to_string(), kind))
            .or_default()
            .push((muxing, info));
    }

    fn enter(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().push(operation.to_string());
        if self.failing.lock().contains(operation) {
            return Err(Error::remote(operation, "injected failure"));
        }
        Ok(())
    }

    fn id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock();
        *next += 1;
        format!("{prefix}-{}", *next)
    }
}

#[async_trait]
impl MuxingSource for FakeBitmovin {
    async fn list_muxings(
        &self,
        job_id: &str,
        kind: MuxingKind,
        offset: u64,
        limit: u32,
    ) -> Result<Page<Muxing>> {
        self.enter("list_muxings")?;
        let outputs = self.outputs.lock();
        let all = outputs
            .get(&(job_id.to_string(), kind))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let start = (offset as usize).min(all.len());
        let end = (start + limit as usize).min(all.len());
        Ok(Page {
            items: all[start..end].iter().map(|(m, _)| m.clone()).collect(),
            total_count: all.len() as u64,
        })
    }

    async fn muxing_information(
        &self,
        job_id: &str,
        kind: MuxingKind,
        muxing_id: &str,
    ) -> Result<MuxingInformation> {
        self.enter("muxing_information")?;
        self.outputs
            .lock()
            .get(&(job_id.to_string(), kind))
            .and_then(|all| all.iter().find(|(m, _)| m.id == muxing_id))
            .map(|(_, info)| info.clone())
            .ok_or_else(|| Error::not_found("muxing", muxing_id))
    }
}

#[async_trait]
impl BitmovinApi for FakeBitmovin {
    async fn create_video_config(&self, codec: VideoCodec, config: &VideoConfig) -> Result<String> {
        self.enter("create_video_config")?;
        let id = self.id("video");
        self.video_configs
            .lock()
            .insert(id.clone(), (codec, config.clone()));
        Ok(id)
    }

    async fn delete_video_config(&self, _codec: VideoCodec, id: &str) -> Result<()> {
        self.enter("delete_video_config")?;
        self.video_configs
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("video config", id))
    }

    async fn create_audio_config(&self, codec: AudioCodec, config: &AudioConfig) -> Result<String> {
        self.enter("create_audio_config")?;
        let id = self.id("audio");
        self.audio_configs
            .lock()
            .insert(id.clone(), (codec, config.clone()));
        Ok(id)
    }

    async fn delete_audio_config(&self, _codec: AudioCodec, id: &str) -> Result<()> {
        self.enter("delete_audio_config")?;
        self.audio_configs
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("audio config", id))
    }

    async fn create_input(&self, input: &HttpInput) -> Result<String> {
        self.enter("create_input")?;
        self.inputs.lock().push(input.clone());
        Ok(self.id("input"))
    }

    async fn create_encoding(&self, encoding: &NewEncoding) -> Result<String> {
        self.enter("create_encoding")?;
        let id = self.id("enc");
        self.encodings.lock().push((id.clone(), encoding.clone()));
        Ok(id)
    }

    async fn create_stream(&self, encoding_id: &str, stream: &NewStream) -> Result<String> {
        self.enter("create_stream")?;
        self.streams
            .lock()
            .push((encoding_id.to_string(), stream.clone()));
        Ok(self.id("stream"))
    }

    async fn create_muxing(
        &self,
        encoding_id: &str,
        kind: MuxingKind,
        muxing: &NewMuxing,
    ) -> Result<String> {
        self.enter("create_muxing")?;
        self.muxings
            .lock()
            .push((encoding_id.to_string(), kind, muxing.clone()));
        Ok(self.id("muxing"))
    }

    async fn start_encoding(&self, encoding_id: &str) -> Result<()> {
        self.enter("start_encoding")?;
        self.started.lock().push(encoding_id.to_string());
        Ok(())
    }

    async fn stop_encoding(&self, encoding_id: &str) -> Result<()> {
        self.enter("stop_encoding")?;
        if !self.started.lock().iter().any(|id| id == encoding_id) {
            return Err(Error::not_found("job", encoding_id));
        }
        self.stopped.lock().push(encoding_id.to_string());
        Ok(())
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<EncodingStatus> {
        self.enter("encoding_status")?;
        self.statuses
            .lock()
            .get(encoding_id)
            .cloned()
            .ok_or_else(|| Error::not_found("job", encoding_id))
    }

    async fn account_information(&self) -> Result<()> {
        self.enter("account_information")
    }
}
