//! Job records
//!
//! After every generation a record is handed to a [`JobRecorder`] on a
//! background task. Recording never delays or fails the request.

use crate::config::RecorderConfig;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

/// One completed (or abandoned) generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub identity: String,
    pub plan: String,
    pub kind: String,
    pub tier: String,
    pub streamed: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub duration_ms: u64,
    pub hint_count: usize,
    pub outcome: JobOutcome,
    pub error_code: Option<String>,
}

impl JobRecord {
    pub fn new(identity: impl Into<String>, plan: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            identity: identity.into(),
            plan: plan.into(),
            kind: String::new(),
            tier: String::new(),
            streamed: false,
            provider: None,
            model: None,
            duration_ms: 0,
            hint_count: 0,
            outcome: JobOutcome::Succeeded,
            error_code: None,
        }
    }
}

/// Sink for job records
#[async_trait]
pub trait JobRecorder: Send + Sync {
    async fn record(&self, record: JobRecord) -> GatewayResult<()>;
}

/// Hand `record` to `recorder` without waiting for it.
///
/// `recorded_at` is stamped here, after the job has finished.
pub fn record_in_background(recorder: Arc<dyn JobRecorder>, mut record: JobRecord) {
    record.recorded_at = Utc::now();
    tokio::spawn(async move {
        let id = record.id;
        if let Err(e) = recorder.record(record).await {
            warn!(%id, error = %e, "failed to record job");
        }
    });
}

/// Build the recorder described by `config`
pub fn from_config(config: &RecorderConfig) -> Arc<dyn JobRecorder> {
    match &config.jsonl_path {
        Some(path) => Arc::new(JsonlRecorder::new(path.clone())),
        None => Arc::new(TracingRecorder),
    }
}

/// Emits each record as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

#[async_trait]
impl JobRecorder for TracingRecorder {
    async fn record(&self, record: JobRecord) -> GatewayResult<()> {
        info!(
            target: "genway::jobs",
            id = %record.id,
            identity = %record.identity,
            kind = %record.kind,
            tier = %record.tier,
            provider = record.provider.as_deref().unwrap_or("-"),
            model = record.model.as_deref().unwrap_or("-"),
            duration_ms = record.duration_ms,
            hints = record.hint_count,
            outcome = ?record.outcome,
            "job recorded"
        );
        Ok(())
    }
}

/// Appends one JSON object per line to a file
#[derive(Debug)]
pub struct JsonlRecorder {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlRecorder {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl JobRecorder for JsonlRecorder {
    async fn record(&self, record: JobRecord) -> GatewayResult<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                GatewayError::internal(format!(
                    "cannot open job log '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
