//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use orchestrator_common::{Error, JobStatus, Preset, PresetSummary, Result, Status};
use orchestrator_db::pool::init_memory_pool;
use serde_json::Value;
use tower::ServiceExt;
use transcode_orchestrator::config::Config;
use transcode_orchestrator::provider::registry::{ProviderContext, ProviderRegistry};
use transcode_orchestrator::provider::store::SqliteSummaryStore;
use transcode_orchestrator::provider::{require_mappings, Capabilities, TranscodingProvider};
use transcode_orchestrator::server::{create_router, AppContext};
use transcode_orchestrator::service::JobService;

/// Provider that keeps jobs in memory and fails on demand.
#[derive(Default)]
pub struct ScriptedProvider {
    pub jobs: Mutex<HashMap<String, JobStatus>>,
    pub fail_with: Mutex<Option<String>>,
}

impl ScriptedProvider {
    /// Move a job to Finished the way a provider reports it: no message and
    /// the raw provider fields.
    pub fn finish(&self, provider_job_id: &str, provider_status: Value) {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(provider_job_id).unwrap();
        job.status = Status::Finished;
        job.status_message.clear();
        job.provider_status = provider_status.as_object().cloned().unwrap_or_default();
    }
}

#[async_trait]
impl TranscodingProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(&["mp4"], &["webm"], &["s3"])
    }

    async fn transcode(&self, source: &str, presets: &[Preset]) -> Result<JobStatus> {
        require_mappings("scripted", presets)?;
        if let Some(msg) = self.fail_with.lock().unwrap().clone() {
            return Err(Error::remote("creating the job", msg));
        }
        let mut jobs = self.jobs.lock().unwrap();
        let id = format!("job-{}", jobs.len() + 1);
        let mut status =
            JobStatus::new("scripted", &id, Status::Queued).with_destination("s3://bucket/");
        status.status_message = format!("accepted {source}");
        jobs.insert(id, status.clone());
        Ok(status)
    }

    async fn job_status(&self, provider_job_id: &str) -> Result<JobStatus> {
        self.jobs
            .lock()
            .unwrap()
            .get(provider_job_id)
            .cloned()
            .ok_or_else(|| Error::not_found("job", provider_job_id))
    }

    async fn cancel_job(&self, provider_job_id: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(provider_job_id)
            .ok_or_else(|| Error::not_found("job", provider_job_id))?;
        job.status = Status::Failed;
        Ok(())
    }

    async fn healthcheck(&self) -> Result<()> {
        Ok(())
    }

    async fn create_preset(&self, preset: &Preset) -> Result<String> {
        Ok(preset.name.clone())
    }

    async fn get_preset(&self, name: &str) -> Result<PresetSummary> {
        Err(Error::not_found("preset summary", name))
    }

    async fn delete_preset(&self, name: &str) -> Result<()> {
        Err(Error::not_found("preset summary", name))
    }
}

/// Router over the built-in providers for `config` plus `scripted`.
pub fn app(config: Config, scripted: Arc<ScriptedProvider>) -> Router {
    let pool = init_memory_pool().unwrap();
    let mut registry = ProviderRegistry::with_builtin_providers(ProviderContext {
        config: Arc::new(config),
        store: Arc::new(SqliteSummaryStore::new(pool.clone())),
    });
    registry.register("scripted", move |_| {
        Ok(scripted.clone() as Arc<dyn TranscodingProvider>)
    });

    let service = JobService::new(Arc::new(registry), pool, Duration::from_secs(5));
    create_router(AppContext {
        service: Arc::new(service),
    })
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send one request and decode the JSON body (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (u16, Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}
