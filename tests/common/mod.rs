// Shared helpers for integration tests: synthetic recordings, scripted
// recognizers and a notifier that records what it publishes.
#![allow(dead_code)]

use anyhow::{bail, Result};
use loqa_transcribe::jobs::JobRegistry;
use loqa_transcribe::nats::{Notifier, TranscriptReadyMessage};
use loqa_transcribe::pipeline::{ChunkOrder, PipelineContext};
use loqa_transcribe::storage::{BlobStore, LocalAudio, MemoryBlobStore, TranscriptKeys};
use loqa_transcribe::stt::SpeechRecognizer;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 16000;

/// 16-bit PCM WAV of `seconds` length filled with a quiet ramp
pub fn wav_bytes(seconds: f64, sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let frames = (seconds * sample_rate as f64).round() as usize;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample((i % 200) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Returns `word<n>` for the n-th call, failing on the listed calls
pub struct ScriptedRecognizer {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    panic_on: Vec<usize>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Vec::new(),
            panic_on: Vec::new(),
        }
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.to_vec();
        self
    }

    pub fn panicking_on(mut self, calls: &[usize]) -> Self {
        self.panic_on = calls.to_vec();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn transcribe(&self, audio: &[i16]) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if audio.is_empty() {
            bail!("empty window");
        }
        if self.panic_on.contains(&call) {
            panic!("scripted panic on call {}", call);
        }
        if self.fail_on.contains(&call) {
            bail!("scripted failure on call {}", call);
        }
        Ok(format!("  word{} \n", call))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Blocks its first call until released, signalling when it starts
pub struct GatedRecognizer {
    started: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

pub struct Gate {
    pub started: mpsc::Receiver<()>,
    pub release: mpsc::Sender<()>,
}

impl GatedRecognizer {
    pub fn new() -> (Self, Gate) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Self {
                started: Mutex::new(Some(started_tx)),
                release: Mutex::new(release_rx),
            },
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl SpeechRecognizer for GatedRecognizer {
    fn transcribe(&self, _audio: &[i16]) -> Result<String> {
        if let Some(started) = self.started.lock().unwrap().take() {
            started.send(()).ok();
            self.release.lock().unwrap().recv().ok();
        }
        Ok("gated".to_string())
    }

    fn model_name(&self) -> &str {
        "gated"
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: tokio::sync::Mutex<Vec<TranscriptReadyMessage>>,
}

impl RecordingNotifier {
    pub async fn messages(&self) -> Vec<TranscriptReadyMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, message: &TranscriptReadyMessage) -> Result<()> {
        self.messages.lock().await.push(message.clone());
        Ok(())
    }
}

/// Bucket whose first `download` waits for a release signal
pub struct GatedStore {
    inner: Arc<MemoryBlobStore>,
    started: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    release: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
}

pub struct DownloadGate {
    pub started: tokio::sync::oneshot::Receiver<()>,
    pub release: tokio::sync::oneshot::Sender<()>,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryBlobStore>) -> (Self, DownloadGate) {
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();
        (
            Self {
                inner,
                started: Mutex::new(Some(started_tx)),
                release: tokio::sync::Mutex::new(Some(release_rx)),
            },
            DownloadGate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

#[async_trait::async_trait]
impl BlobStore for GatedStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.fetch(key).await
    }

    async fn download(&self, key: &str) -> Result<LocalAudio> {
        let started = self.started.lock().unwrap().take();
        if let Some(started) = started {
            started.send(()).ok();
            if let Some(release) = self.release.lock().await.take() {
                release.await.ok();
            }
        }
        self.inner.download(key).await
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String> {
        self.inner.upload(key, content).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

pub fn context(
    store: Arc<dyn BlobStore>,
    recognizer: Arc<dyn SpeechRecognizer>,
    notifier: Arc<RecordingNotifier>,
) -> PipelineContext {
    PipelineContext {
        registry: Arc::new(JobRegistry::new()),
        store,
        recognizer,
        notifier,
        keys: TranscriptKeys::default(),
        chunk_window: Duration::from_secs(1),
        chunk_order: ChunkOrder::Numeric,
    }
}

pub async fn seed_recording(store: &MemoryBlobStore, key: &str, seconds: f64) {
    store
        .upload(key, wav_bytes(seconds, SAMPLE_RATE, 1))
        .await
        .unwrap();
}

pub async fn read_text(store: &MemoryBlobStore, key: &str) -> String {
    String::from_utf8(store.fetch(key).await.unwrap()).unwrap()
}
