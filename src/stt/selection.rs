use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use sysinfo::System;
use tracing::info;

const GB: u64 = 1_000_000_000;

/// Whisper model size, smallest to largest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// ggml model file name for this size
    pub fn file_name(&self) -> String {
        format!("ggml-{}.bin", self.as_str())
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiny" => Ok(Self::Tiny),
            "base" => Ok(Self::Base),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => bail!("unknown model size: {}", other),
        }
    }
}

/// Where inference runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    Cpu,
}

impl Device {
    /// Accelerated path when the binary was built with GPU support
    pub fn detect() -> Self {
        if cfg!(feature = "cuda") {
            Self::Cuda
        } else {
            Self::Cpu
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self, Self::Cuda)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        })
    }
}

/// Pick the largest model the machine's memory comfortably holds
pub fn auto_select_model(total_memory_bytes: u64) -> ModelSize {
    if total_memory_bytes >= 24 * GB {
        ModelSize::Large
    } else if total_memory_bytes >= 16 * GB {
        ModelSize::Medium
    } else if total_memory_bytes >= 8 * GB {
        ModelSize::Small
    } else {
        ModelSize::Base
    }
}

pub fn system_memory_bytes() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.total_memory()
}

/// Model and device chosen for this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizerPlan {
    pub model: ModelSize,
    pub device: Device,
}

impl RecognizerPlan {
    /// An explicit size wins; otherwise size follows total memory
    pub fn resolve(explicit: Option<ModelSize>) -> Self {
        let device = Device::detect();
        let model = match explicit {
            Some(model) => model,
            None => {
                let memory = system_memory_bytes();
                info!("Detected RAM: {:.2} GB", memory as f64 / GB as f64);
                auto_select_model(memory)
            }
        };

        info!("Speech model: {} on {}", model, device);
        Self { model, device }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_select_thresholds() {
        assert_eq!(auto_select_model(4 * GB), ModelSize::Base);
        assert_eq!(auto_select_model(8 * GB), ModelSize::Small);
        assert_eq!(auto_select_model(16 * GB), ModelSize::Medium);
        assert_eq!(auto_select_model(23 * GB), ModelSize::Medium);
        assert_eq!(auto_select_model(64 * GB), ModelSize::Large);
    }

    #[test]
    fn test_explicit_size_wins() {
        let plan = RecognizerPlan::resolve(Some(ModelSize::Tiny));
        assert_eq!(plan.model, ModelSize::Tiny);
    }

    #[test]
    fn test_parse_model_size() {
        assert_eq!("Medium".parse::<ModelSize>().unwrap(), ModelSize::Medium);
        assert!("huge".parse::<ModelSize>().is_err());
        assert_eq!(ModelSize::Large.file_name(), "ggml-large.bin");
    }

    #[test]
    fn test_cpu_without_gpu_feature() {
        if !cfg!(feature = "cuda") {
            assert_eq!(Device::detect(), Device::Cpu);
            assert!(!Device::detect().is_accelerated());
        }
    }
}
