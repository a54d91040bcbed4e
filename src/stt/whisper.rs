//! Whisper engine via whisper-rs.
//!
//! Requires the `whisper` feature (and cmake) to build.

use super::recognizer::SpeechRecognizer;
use super::selection::RecognizerPlan;
use crate::config::SttConfig;
use crate::error::PipelineError;
use anyhow::{Context, Result};
use std::sync::Mutex;
use tracing::info;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper model shared by all jobs; inference is serialized on the context lock
pub struct WhisperRecognizer {
    context: Mutex<WhisperContext>,
    language: Option<String>,
    threads: Option<usize>,
    model_name: String,
}

impl WhisperRecognizer {
    pub fn load(config: &SttConfig, plan: RecognizerPlan) -> Result<Self> {
        let model_path = config.model_dir.join(plan.model.file_name());
        if !model_path.exists() {
            return Err(PipelineError::Recognition(format!(
                "model not found at {}",
                model_path.display()
            ))
            .into());
        }

        info!(
            "Loading Whisper model {} (gpu={})",
            model_path.display(),
            plan.device.is_accelerated()
        );

        let mut params = WhisperContextParameters::default();
        params.use_gpu(plan.device.is_accelerated());

        let path = model_path
            .to_str()
            .context("Invalid UTF-8 in model path")?;
        let context = WhisperContext::new_with_params(path, params)
            .map_err(|e| PipelineError::Recognition(format!("Failed to load model: {}", e)))?;

        Ok(Self {
            context: Mutex::new(context),
            language: config.language.clone(),
            threads: config.threads,
            model_name: plan.model.to_string(),
        })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &[i16]) -> Result<String> {
        let samples: Vec<f32> = audio.iter().map(|&s| s as f32 / 32768.0).collect();

        let context = self
            .context
            .lock()
            .map_err(|e| PipelineError::Recognition(format!("Context lock poisoned: {}", e)))?;

        let mut state = context
            .create_state()
            .map_err(|e| PipelineError::Recognition(format!("Failed to create state: {}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(self.language.as_deref());
        if let Some(threads) = self.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| PipelineError::Recognition(format!("Inference failed: {}", e)))?;

        let mut text = String::new();
        for segment in state.as_iter() {
            text.push_str(&segment.to_string());
        }

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
