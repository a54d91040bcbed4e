use std::path::Path;

/// Blob path of a recording reference.
///
/// Accepts a plain path, `gs://bucket/path`, or `https://host/bucket/path`;
/// the bucket segment is dropped from URIs.
pub fn blob_path(recording: &str) -> String {
    let recording = recording.trim();

    let Some((scheme, rest)) = recording.split_once("://") else {
        return recording.trim_start_matches('/').to_string();
    };

    // Drop query and fragment from web URLs
    let rest = if scheme.starts_with("http") {
        rest.split(['?', '#']).next().unwrap_or(rest)
    } else {
        rest
    };

    let mut segments = rest.splitn(2, '/');
    let first = segments.next().unwrap_or_default();
    let remainder = segments.next().unwrap_or_default();

    if scheme.starts_with("http") {
        // host/bucket/path
        remainder
            .split_once('/')
            .map(|(_, path)| path.to_string())
            .unwrap_or_else(|| remainder.to_string())
    } else if remainder.is_empty() {
        first.to_string()
    } else {
        remainder.to_string()
    }
}

/// File name of a recording without directories or extension
pub fn base_name(recording: &str) -> String {
    let path = blob_path(recording);
    Path::new(&path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path.as_str())
        .to_string()
}

/// Names of transcript artifacts under a common prefix
#[derive(Debug, Clone)]
pub struct TranscriptKeys {
    prefix: String,
}

impl TranscriptKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Final transcript key; depends only on the recording's base name
    pub fn final_key(&self, recording: &str) -> String {
        self.join(&format!("{}.txt", base_name(recording)))
    }

    pub fn chunk_key(&self, session_id: &str, index: usize) -> String {
        format!("{}{}.txt", self.chunk_prefix(session_id), index)
    }

    /// Listing prefix shared by every chunk of a session
    pub fn chunk_prefix(&self, session_id: &str) -> String {
        self.join(&format!("{}_part", session_id))
    }

    /// Window index embedded in a chunk key
    pub fn chunk_index(&self, key: &str) -> Option<usize> {
        let (_, tail) = key.rsplit_once("_part")?;
        tail.strip_suffix(".txt")?.parse().ok()
    }

    fn join(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }
}

impl Default for TranscriptKeys {
    fn default() -> Self {
        Self::new("transcripts")
    }
}
