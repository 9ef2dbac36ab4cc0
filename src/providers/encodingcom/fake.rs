//! In-memory [`EncodingComApi`].

use std::collections::HashMap;

use async_trait::async_trait;
use orchestrator_common::{Error, Result};
use parking_lot::Mutex;

use super::client::{AddedMedia, ApiStatus, EncodingComApi, MediaFormat, MediaStatus, PresetFormat};

#[derive(Debug, Clone)]
pub struct SubmittedMedia {
    pub source: Vec<String>,
    pub formats: Vec<MediaFormat>,
    pub region: Option<String>,
}

pub struct FakeEncodingCom {
    pub media: Mutex<HashMap<String, SubmittedMedia>>,
    pub statuses: Mutex<HashMap<String, MediaStatus>>,
    pub canceled: Mutex<Vec<String>>,
    pub presets: Mutex<HashMap<String, PresetFormat>>,
    pub api_status: Mutex<ApiStatus>,
    pub fail_add: Mutex<Option<String>>,
    next: Mutex<u32>,
}

impl Default for FakeEncodingCom {
    fn default() -> Self {
        Self {
            media: Mutex::default(),
            statuses: Mutex::default(),
            canceled: Mutex::default(),
            presets: Mutex::default(),
            api_status: Mutex::new(ApiStatus {
                status: "Ok".into(),
                status_code: "ok".into(),
                incident: String::new(),
            }),
            fail_add: Mutex::default(),
            next: Mutex::default(),
        }
    }
}

impl FakeEncodingCom {
    pub fn set_status(&self, media_id: &str, status: MediaStatus) {
        self.statuses.lock().insert(media_id.to_string(), status);
    }
}

#[async_trait]
impl EncodingComApi for FakeEncodingCom {
    async fn add_media(
        &self,
        source: &[String],
        formats: &[MediaFormat],
        region: Option<&str>,
    ) -> Result<AddedMedia> {
        if let Some(msg) = self.fail_add.lock().clone() {
            return Err(Error::remote("adding the media", msg));
        }
        let media_id = {
            let mut next = self.next.lock();
            *next += 1;
            format!("media-{}", *next)
        };
        self.media.lock().insert(
            media_id.clone(),
            SubmittedMedia {
                source: source.to_vec(),
                formats: formats.to_vec(),
                region: region.map(String::from),
            },
        );
        Ok(AddedMedia {
            media_id,
            message: "it worked".into(),
        })
    }

    async fn media_status(&self, media_id: &str) -> Result<MediaStatus> {
        self.statuses
            .lock()
            .get(media_id)
            .cloned()
            .ok_or_else(|| Error::not_found("job", media_id))
    }

    async fn cancel_media(&self, media_id: &str) -> Result<()> {
        if !self.media.lock().contains_key(media_id) {
            return Err(Error::not_found("job", media_id));
        }
        self.canceled.lock().push(media_id.to_string());
        Ok(())
    }

    async fn save_preset(&self, name: &str, format: &PresetFormat) -> Result<String> {
        self.presets.lock().insert(name.to_string(), format.clone());
        Ok(name.to_string())
    }

    async fn delete_preset(&self, name: &str) -> Result<()> {
        self.presets
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("encoding.com preset", name))
    }

    async fn api_status(&self) -> Result<ApiStatus> {
        Ok(self.api_status.lock().clone())
    }
}
