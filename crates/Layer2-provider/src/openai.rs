//! OpenAI-compatible SSE chunk adapter
//!
//! Turns one `data:` line of a chat-completions stream into provider
//! chunks. Transport stays with the caller.

use crate::chunk::{ProviderChunk, RawToolCallChunk};
use serde::Deserialize;
use warden_foundation::{Error, Result};

/// Parse one SSE line into provider chunks
///
/// Blank lines, comments and non-data fields produce no chunks.
pub fn parse_sse_line(line: &str) -> Result<Vec<ProviderChunk>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Ok(Vec::new());
    }

    let Some(data) = line
        .strip_prefix("data:")
        .map(str::trim_start)
    else {
        return Ok(Vec::new());
    };

    if data == "[DONE]" {
        return Ok(vec![ProviderChunk::Done]);
    }

    let chunk: OpenAiStreamChunk = serde_json::from_str(data)
        .map_err(|e| Error::Decode(format!("Failed to parse SSE chunk: {}", e)))?;

    Ok(chunk.into_provider_chunks())
}

// ============================================================================
// OpenAI Streaming Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
}

impl OpenAiStreamChunk {
    fn into_provider_chunks(self) -> Vec<ProviderChunk> {
        let mut chunks = Vec::new();

        for choice in self.choices {
            let delta = choice.delta;

            if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                chunks.push(ProviderChunk::Text(content));
            }

            for tc in delta.tool_calls.unwrap_or_default() {
                let function = tc.function.unwrap_or_default();
                chunks.push(ProviderChunk::ToolCall(RawToolCallChunk {
                    index: tc.index,
                    id: tc.id,
                    name: function.name,
                    arguments: function.arguments,
                }));
            }

            if let Some(reason) = choice.finish_reason {
                chunks.push(ProviderChunk::Finish(reason));
            }
        }

        chunks
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiStreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamToolCall {
    #[serde(default)]
    index: u32,
    id: Option<String>,
    function: Option<OpenAiStreamFunction>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiStreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_line() {
        let line = r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"read_file","arguments":""}}]},"finish_reason":null}]}"#;
        let chunks = parse_sse_line(line).unwrap();
        assert_eq!(
            chunks,
            vec![ProviderChunk::ToolCall(RawToolCallChunk {
                index: 0,
                id: Some("call_1".into()),
                name: Some("read_file".into()),
                arguments: Some(String::new()),
            })]
        );
    }

    #[test]
    fn test_text_and_finish() {
        let line = r#"data: {"choices":[{"delta":{"content":"hi"},"finish_reason":"tool_calls"}]}"#;
        let chunks = parse_sse_line(line).unwrap();
        assert_eq!(
            chunks,
            vec![
                ProviderChunk::Text("hi".into()),
                ProviderChunk::Finish("tool_calls".into()),
            ]
        );
    }

    #[test]
    fn test_done_and_ignored_lines() {
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), vec![ProviderChunk::Done]);
        assert!(parse_sse_line("").unwrap().is_empty());
        assert!(parse_sse_line(": keep-alive").unwrap().is_empty());
        assert!(parse_sse_line("event: message").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let err = parse_sse_line("data: {\"choices\":[").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
