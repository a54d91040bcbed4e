use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::jobs::CancelPolicy;
use crate::pipeline::ChunkOrder;
use crate::stt::ModelSize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub stt: SttConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "loqa-transcribe".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Allowed CORS origins (empty = allow any)
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8082,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the filesystem bucket
    pub root: PathBuf,
    /// Key prefix for chunk and final transcripts
    pub transcripts_prefix: String,
    /// Base URL under which stored blobs are reachable
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./bucket"),
            transcripts_prefix: "transcripts".to_string(),
            public_base_url: "http://localhost:8082/blobs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of jobs that may run at once
    pub workers: usize,
    /// Length of each transcription window in seconds
    pub chunk_seconds: u64,
    pub chunk_order: ChunkOrder,
    /// Effect of a cancel request on a job that already finished
    pub cancel_terminal: CancelPolicy,
    /// Maximum wait between two status lines on a stream
    pub stream_interval_secs: u64,
    /// Wall-clock cutoff for a status stream
    pub job_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            chunk_seconds: 30,
            chunk_order: ChunkOrder::default(),
            cancel_terminal: CancelPolicy::default(),
            stream_interval_secs: 20,
            job_timeout_secs: 3600,
        }
    }
}

impl PipelineConfig {
    pub fn chunk_window(&self) -> Duration {
        Duration::from_secs(self.chunk_seconds)
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_secs(self.stream_interval_secs)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Explicit model size; chosen from total memory when absent
    pub model_size: Option<ModelSize>,
    /// Directory holding ggml-<size>.bin model files
    pub model_dir: PathBuf,
    pub language: Option<String>,
    pub threads: Option<usize>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model_size: None,
            model_dir: PathBuf::from("./models"),
            language: None,
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URL; notifications are skipped when unset
    pub url: Option<String>,
    pub subject: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: None,
            subject: "transcripts.ready".to_string(),
        }
    }
}

impl Config {
    /// Load settings from an optional file at `path`, overridden by `LOQA_*`
    /// environment variables (`LOQA_SERVICE__HTTP__PORT=9000`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("LOQA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            bail!("pipeline.workers must be at least 1");
        }
        if self.pipeline.chunk_seconds == 0 {
            bail!("pipeline.chunk_seconds must be greater than 0");
        }
        if self.pipeline.stream_interval_secs == 0 {
            bail!("pipeline.stream_interval_secs must be greater than 0");
        }
        if self.pipeline.job_timeout_secs == 0 {
            bail!("pipeline.job_timeout_secs must be greater than 0");
        }
        Ok(())
    }
}
