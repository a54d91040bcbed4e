use loqa_transcribe::nats::TranscriptReadyMessage;

#[test]
fn test_transcript_ready_serialization() {
    let msg = TranscriptReadyMessage::new(
        "a1b2c3d4",
        "session-0123456789ab",
        "gs://clinic-bucket/recordings/visit-42.wav",
        "transcripts/visit-42.txt",
        "http://localhost:8082/blobs/transcripts/visit-42.txt",
    );

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"job_id\":\"a1b2c3d4\""));
    assert!(json.contains("\"session_id\":\"session-0123456789ab\""));
    assert!(json.contains("\"transcript\":\"transcripts/visit-42.txt\""));

    let deserialized: TranscriptReadyMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.recording, msg.recording);
    assert_eq!(deserialized.url, msg.url);
    assert_eq!(deserialized.timestamp, msg.timestamp);
}

#[test]
fn test_transcript_ready_timestamp_is_rfc3339() {
    let msg = TranscriptReadyMessage::new("j", "s", "r.wav", "transcripts/r.txt", "memory://m/transcripts/r.txt");

    assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
}

#[test]
fn test_transcript_ready_from_external_json() {
    let json = r#"{
        "job_id": "deadbeef",
        "session_id": "session-feedfacecafe",
        "recording": "recordings/intake.mp3",
        "transcript": "transcripts/intake.txt",
        "url": "http://localhost:8082/blobs/transcripts/intake.txt",
        "timestamp": "2026-03-02T09:15:00Z"
    }"#;

    let msg: TranscriptReadyMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.job_id, "deadbeef");
    assert_eq!(msg.transcript, "transcripts/intake.txt");
}
