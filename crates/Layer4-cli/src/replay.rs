//! `warden replay` - 기록된 청크 스트림 재생
//!
//! Each transcript line is one of:
//! - a raw chunk object `{"index": 0, "id": "c1", "name": "...", "arguments": "..."}`
//! - a finish object `{"finish_reason": "tool_calls"}`
//! - an OpenAI-compatible SSE line (`data: {...}` / `data: [DONE]`)

use anyhow::Context;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use warden_core::{
    CustomToolRegistry, ResolvedToolCall, StreamUpdate, ToolCallResolver, ToolCallStreamState,
    ToolCatalog,
};
use warden_foundation::WardenConfig;
use warden_provider::{
    aggregate, parse_sse_line, AggregatedEvent, ProviderChunk, RawToolCallChunk, ToolCallEvent,
};

/// 재생 출력 한 줄
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ReplayRecord<'a> {
    Text { text: &'a str },
    Event { event: &'a ToolCallEvent },
    Partial { call: &'a ResolvedToolCall },
    Resolved { call: &'a ResolvedToolCall },
    Failed { id: &'a str, name: &'a str, error: String },
}

/// 트랜스크립트 파일 재생
pub async fn run(config: &WardenConfig, path: &Path, json: bool) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read transcript {}", path.display()))?;
    let chunks = parse_transcript(&content)?;
    tracing::debug!(chunks = chunks.len(), "Replaying transcript");

    let resolver = ToolCallResolver::new(
        Arc::new(ToolCatalog::from_config(config)),
        Arc::new(CustomToolRegistry::new()),
    );
    let mut state = ToolCallStreamState::new(resolver);
    state.begin_request();

    let mut resolved = 0usize;
    let mut failed = 0usize;

    let mut events = aggregate(futures::stream::iter(chunks));
    while let Some(event) = events.next().await {
        match &event {
            AggregatedEvent::Text(text) => emit(json, &ReplayRecord::Text { text })?,
            AggregatedEvent::ToolCall(e) => emit(json, &ReplayRecord::Event { event: e })?,
        }
        if let AggregatedEvent::ToolCall(e) = event {
            if let Some(update) = state.handle_event(e) {
                report(json, &update, &mut resolved, &mut failed)?;
            }
        }
    }

    for update in state.finish() {
        report(json, &update, &mut resolved, &mut failed)?;
    }

    if !json {
        println!();
        println!("{} resolved, {} failed", resolved, failed);
    }
    Ok(())
}

/// 트랜스크립트 텍스트 -> 프로바이더 청크
pub fn parse_transcript(content: &str) -> anyhow::Result<Vec<ProviderChunk>> {
    let mut chunks = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = parse_line(line).with_context(|| format!("line {}", n + 1))?;
        chunks.extend(parsed);
    }
    Ok(chunks)
}

fn parse_line(line: &str) -> anyhow::Result<Vec<ProviderChunk>> {
    if line.starts_with("data:") || line.starts_with(':') {
        return Ok(parse_sse_line(line)?);
    }

    let value: Value = serde_json::from_str(line)?;
    if let Some(reason) = value.get("finish_reason").and_then(Value::as_str) {
        return Ok(vec![ProviderChunk::Finish(reason.to_string())]);
    }
    if let Some(text) = value.get("text").and_then(Value::as_str) {
        return Ok(vec![ProviderChunk::Text(text.to_string())]);
    }
    let chunk: RawToolCallChunk = serde_json::from_value(value)?;
    Ok(vec![ProviderChunk::ToolCall(chunk)])
}

fn report(
    json: bool,
    update: &StreamUpdate,
    resolved: &mut usize,
    failed: &mut usize,
) -> anyhow::Result<()> {
    match update {
        StreamUpdate::Partial(call) => {
            if json {
                emit(json, &ReplayRecord::Partial { call })?;
            }
        }
        StreamUpdate::Complete(call) => {
            *resolved += 1;
            emit(json, &ReplayRecord::Resolved { call })?;
        }
        StreamUpdate::Failed { id, name, error } => {
            *failed += 1;
            emit(
                json,
                &ReplayRecord::Failed {
                    id,
                    name,
                    error: error.to_string(),
                },
            )?;
        }
    }
    Ok(())
}

fn emit(json: bool, record: &ReplayRecord<'_>) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(record)?);
        return Ok(());
    }

    match record {
        ReplayRecord::Text { text } => println!("text     {:?}", text),
        ReplayRecord::Event { event } => match event {
            ToolCallEvent::Started { id, name } => println!("started  {} {}", id, name),
            ToolCallEvent::Delta { id, delta } => println!("delta    {} {}", id, delta),
            ToolCallEvent::Ended { id } => println!("ended    {}", id),
        },
        ReplayRecord::Partial { .. } => {}
        ReplayRecord::Resolved { call } => match call {
            ResolvedToolCall::ToolUse(tool) => {
                println!("resolved {} {}", tool.id.as_deref().unwrap_or("-"), tool.describe());
                if let Some(original) = &tool.original_name {
                    println!("         (called as {})", original);
                }
                if let Some(args) = &tool.arguments {
                    println!("         {}", args.to_value());
                }
            }
            ResolvedToolCall::Dynamic(mcp) => {
                println!("resolved {} {}", mcp.id.as_deref().unwrap_or("-"), mcp.describe());
                println!("         {}", mcp.arguments);
            }
        },
        ReplayRecord::Failed { id, name, error } => {
            println!("failed   {} {}: {}", id, name, error)
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript_mixed_lines() {
        let transcript = r#"
# recorded from a local run
{"index":0,"id":"c1","name":"execute_command"}
{"index":0,"arguments":"{\"command\":\"ls\"}"}
{"finish_reason":"tool_calls"}
data: [DONE]
"#;
        let chunks = parse_transcript(transcript).unwrap();

        assert_eq!(chunks.len(), 4);
        assert_eq!(
            chunks[0],
            ProviderChunk::ToolCall(
                RawToolCallChunk::new(0).with_id("c1").with_name("execute_command")
            )
        );
        assert_eq!(chunks[2], ProviderChunk::Finish("tool_calls".into()));
        assert_eq!(chunks[3], ProviderChunk::Done);
    }

    #[test]
    fn test_parse_transcript_reports_line() {
        let err = parse_transcript("{\"index\":0}\nnot json").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
