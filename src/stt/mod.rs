//! Speech recognition
//!
//! The pipeline only sees `SpeechRecognizer`. Which engine backs it, on which
//! device and with which model size, is decided here at startup.

mod recognizer;
mod selection;
#[cfg(feature = "whisper")]
mod whisper;

pub use recognizer::SpeechRecognizer;
pub use selection::{auto_select_model, system_memory_bytes, Device, ModelSize, RecognizerPlan};
#[cfg(feature = "whisper")]
pub use whisper::WhisperRecognizer;

use crate::config::SttConfig;
use anyhow::Result;
use std::sync::Arc;

/// Build the recognizer for this binary's compiled-in engine
pub fn create_recognizer(config: &SttConfig) -> Result<Arc<dyn SpeechRecognizer>> {
    let plan = RecognizerPlan::resolve(config.model_size);

    #[cfg(feature = "whisper")]
    {
        let recognizer = WhisperRecognizer::load(config, plan)?;
        Ok(Arc::new(recognizer))
    }

    #[cfg(not(feature = "whisper"))]
    {
        Err(crate::error::PipelineError::Recognition(format!(
            "no speech engine compiled in (wanted {} on {}); rebuild with --features whisper",
            plan.model, plan.device
        ))
        .into())
    }
}
