use serde::{Deserialize, Serialize};

/// Path of the streaming transcription endpoint
pub const STREAM_PATH: &str = "/ws";
/// Path of the outline generation endpoint
pub const OUTLINE_PATH: &str = "/generate_outline";
/// Path of the report generation endpoint
pub const REPORT_PATH: &str = "/generate_report";

/// Request body for the outline stage
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OutlineRequest {
    pub transcript: String,
    pub article_style: String,
}

impl OutlineRequest {
    pub fn new(transcript: impl Into<String>, article_style: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            article_style: article_style.into(),
        }
    }
}

/// Response body from the outline stage
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OutlineResponse {
    pub outline: String,
}

/// Request body for the report stage
///
/// `outline` carries whatever the user has made of the outline by the time
/// the request is issued, not the text the outline stage returned.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub transcript: String,
    pub outline: String,
    pub article_style: String,
}

impl ReportRequest {
    pub fn new(
        transcript: impl Into<String>,
        outline: impl Into<String>,
        article_style: impl Into<String>,
    ) -> Self {
        Self {
            transcript: transcript.into(),
            outline: outline.into(),
            article_style: article_style.into(),
        }
    }
}

/// Response body from the report stage
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReportResponse {
    pub report: String,
}

/// Encode one resampled block as a binary frame: f32 samples, little-endian
pub fn encode_audio_frame(samples: &[f32]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        frame.extend_from_slice(&sample.to_le_bytes());
    }
    frame
}

/// WebSocket URL for a streaming session, with the active transcription
/// settings as query parameters
pub fn stream_url(server: &str, secure: bool, language: &str, model: &str) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    format!("{scheme}://{server}{STREAM_PATH}?language={language}&model={model}")
}

/// HTTP URL for a generation endpoint
pub fn endpoint_url(server: &str, secure: bool, path: &str) -> String {
    let scheme = if secure { "https" } else { "http" };
    format!("{scheme}://{server}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outline_request_wire_shape() {
        let request = OutlineRequest::new("hello world", "a formal academic style");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "transcript": "hello world",
                "articleStyle": "a formal academic style",
            })
        );
    }

    #[test]
    fn test_report_request_wire_shape() {
        let request = ReportRequest::new("hello world", "- intro\n- body", "technical");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "transcript": "hello world",
                "outline": "- intro\n- body",
                "articleStyle": "technical",
            })
        );
    }

    #[test]
    fn test_responses_parse_from_wire_json() {
        let outline: OutlineResponse = serde_json::from_str(r#"{"outline": "- one"}"#).unwrap();
        assert_eq!(outline.outline, "- one");

        let report: ReportResponse = serde_json::from_str(r##"{"report": "# Title"}"##).unwrap();
        assert_eq!(report.report, "# Title");
    }

    #[test]
    fn test_audio_frame_is_little_endian_f32() {
        let frame = encode_audio_frame(&[0.0, 1.0, -1.0]);
        assert_eq!(frame.len(), 12);
        assert_eq!(&frame[0..4], &[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&frame[4..8], &[0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(&frame[8..12], &[0x00, 0x00, 0x80, 0xbf]);
    }

    #[test]
    fn test_stream_url_carries_settings() {
        let url = stream_url("localhost:8000", false, "en", "distil-large-v3");
        assert_eq!(
            url,
            "ws://localhost:8000/ws?language=en&model=distil-large-v3"
        );

        let url = stream_url("example.com", true, "de", "large-v3");
        assert_eq!(url, "wss://example.com/ws?language=de&model=large-v3");
    }

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            endpoint_url("localhost:8000", false, OUTLINE_PATH),
            "http://localhost:8000/generate_outline"
        );
        assert_eq!(
            endpoint_url("example.com", true, REPORT_PATH),
            "https://example.com/generate_report"
        );
    }
}
