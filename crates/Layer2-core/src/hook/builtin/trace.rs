//! 변경 작업 추적 로그 (`.orchestration/agent_trace.jsonl`)

use super::sha256_hex;
use crate::hook::types::{HookInvocationContext, PostToolHook};
use crate::tool::ToolName;
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;
use tokio::io::AsyncWriteExt;
use warden_foundation::Result;

/// 추적 로그 디렉토리 (cwd 기준)
pub const TRACE_DIR: &str = ".orchestration";

/// 추적 로그 파일
pub const TRACE_FILE: &str = "agent_trace.jsonl";

const UNKNOWN_REVISION: &str = "UNKNOWN";

#[derive(Debug, Serialize)]
struct TraceEntry {
    id: String,
    timestamp: String,
    tool: String,
    classification: &'static str,
    outcome: &'static str,
    vcs: Vcs,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<TraceFile>,
}

#[derive(Debug, Serialize)]
struct Vcs {
    revision_id: String,
}

#[derive(Debug, Serialize)]
struct TraceFile {
    relative_path: String,
    conversations: Vec<Conversation>,
}

#[derive(Debug, Serialize)]
struct Conversation {
    url: String,
    contributor: Contributor,
    ranges: Vec<LineSpan>,
    related: Vec<Related>,
}

#[derive(Debug, Serialize)]
struct Contributor {
    entity_type: &'static str,
    model_identifier: String,
}

#[derive(Debug, Serialize)]
struct LineSpan {
    start_line: usize,
    end_line: usize,
    content_hash: String,
}

#[derive(Debug, Serialize)]
struct Related {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
}

/// 변경 도구 호출마다 JSON 한 줄 기록
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceLoggingHook;

#[async_trait]
impl PostToolHook for TraceLoggingHook {
    fn name(&self) -> &str {
        "TraceLoggingHook"
    }

    async fn observe(&self, ctx: &HookInvocationContext) -> Result<()> {
        let Some(tool) = ToolName::parse(&ctx.tool_name).filter(ToolName::is_destructive) else {
            return Ok(());
        };

        let mut files = Vec::new();
        if tool.is_file_mutation() {
            for path in ctx.target_paths() {
                if let Some(file) = trace_file(ctx, tool, path).await {
                    files.push(file);
                }
            }
        }

        let entry = TraceEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: ctx.timestamp.to_rfc3339(),
            tool: tool.to_string(),
            classification: classify(tool),
            outcome: if ctx.succeeded() { "success" } else { "error" },
            vcs: Vcs {
                revision_id: git_revision(&ctx.task.cwd).await,
            },
            files,
        };

        let dir = ctx.task.cwd.join(TRACE_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(TRACE_FILE))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(tool = %tool, trace_id = %entry.id, "Trace entry written");
        Ok(())
    }
}

fn classify(tool: ToolName) -> &'static str {
    match tool {
        ToolName::ApplyDiff => "AST_REFACTOR",
        ToolName::ExecuteCommand => "COMMAND",
        _ => "FILE_WRITE",
    }
}

async fn trace_file(ctx: &HookInvocationContext, tool: ToolName, path: &str) -> Option<TraceFile> {
    let absolute = ctx.resolve_path(path);
    let content = match tokio::fs::read(&absolute).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %absolute.display(), error = %e, "Cannot hash file for trace");
            return None;
        }
    };
    let line_count = String::from_utf8_lossy(&content).split('\n').count();

    let start_line = if tool == ToolName::ApplyDiff {
        ctx.arg_str("diff").and_then(hunk_start).unwrap_or(1)
    } else {
        1
    };

    let related = ctx
        .active_scope_id
        .iter()
        .map(|id| Related {
            kind: "specification",
            value: id.clone(),
        })
        .collect();

    Some(TraceFile {
        relative_path: path.to_string(),
        conversations: vec![Conversation {
            url: ctx.task.task_id.clone(),
            contributor: Contributor {
                entity_type: "AI",
                model_identifier: ctx
                    .task
                    .model_id
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            ranges: vec![LineSpan {
                start_line,
                end_line: line_count.max(start_line),
                content_hash: format!("sha256:{}", sha256_hex(&content)),
            }],
            related,
        }],
    })
}

/// unified diff 첫 hunk의 새 파일 시작 줄
fn hunk_start(diff: &str) -> Option<usize> {
    static HUNK: OnceLock<Option<Regex>> = OnceLock::new();
    let re = HUNK
        .get_or_init(|| Regex::new(r"@@ -(\d+),?\d* \+(\d+),?\d* @@").ok())
        .as_ref()?;
    re.captures(diff)?.get(2)?.as_str().parse().ok()
}

/// 현재 git 리비전 (실패 시 UNKNOWN)
async fn git_revision(cwd: &Path) -> String {
    let output = tokio::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(cwd)
        .output()
        .await;
    match output {
        Ok(out) if out.status.success() => {
            let rev = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if rev.is_empty() {
                UNKNOWN_REVISION.to_string()
            } else {
                rev
            }
        }
        _ => UNKNOWN_REVISION.to_string(),
    }
}
