pub mod file;
pub mod window;

pub use file::{AudioFile, TARGET_SAMPLE_RATE};
pub use window::{plan_windows, ChunkWindow};
