//! 낙관적 잠금 (read/write 해시 원장)

use super::sha256_hex;
use crate::hook::types::{HookInvocationContext, HookVerdict, PostToolHook, PreToolHook};
use crate::tool::ToolName;
use async_trait::async_trait;
use serde_json::Value;
use warden_foundation::Result;

/// 마지막 읽기 이후 디스크에서 바뀐 파일에 대한 쓰기 차단
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcurrencyPreHook;

#[async_trait]
impl PreToolHook for ConcurrencyPreHook {
    fn name(&self) -> &str {
        "ConcurrencyPreHook"
    }

    async fn check(&self, ctx: &HookInvocationContext) -> Result<Option<HookVerdict>> {
        if !ToolName::parse(&ctx.tool_name).is_some_and(|t| t.is_file_mutation()) {
            return Ok(None);
        }
        for path in ctx.target_paths() {
            let absolute = ctx.resolve_path(path);

            // 읽은 적 없는 파일 (새 파일 포함)
            let Some(stored) = ctx.governance.read_hash(&absolute) else {
                continue;
            };
            // 없어진 파일은 도구가 처리
            let Ok(current) = tokio::fs::read(&absolute).await else {
                continue;
            };

            if sha256_hex(&current) != stored {
                tracing::info!(path = %absolute.display(), "Stale write blocked");
                return Ok(Some(HookVerdict::deny(format!(
                    "Stale file: '{}' has been modified by another agent or user since you last read it. Re-read the file with 'read_file' before writing to it.",
                    path
                ))));
            }
        }
        Ok(None)
    }
}

/// 성공한 `read_file` 이후 디스크 파일 해시 기록
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcurrencyPostHook;

#[async_trait]
impl PostToolHook for ConcurrencyPostHook {
    fn name(&self) -> &str {
        "ConcurrencyPostHook"
    }

    async fn observe(&self, ctx: &HookInvocationContext) -> Result<()> {
        if !ctx.succeeded() || ctx.tool_name != ToolName::ReadFile.as_str() {
            return Ok(());
        }

        for path in read_paths(&ctx.arguments) {
            let absolute = ctx.resolve_path(path);
            match tokio::fs::read(&absolute).await {
                Ok(content) => {
                    ctx.governance
                        .record_read_hash(&absolute, sha256_hex(&content));
                }
                Err(e) => {
                    tracing::debug!(path = %absolute.display(), error = %e, "Skipping read hash");
                }
            }
        }
        Ok(())
    }
}

/// `read_file` 인자에서 경로 추출 (`path` 또는 `files[].path`)
fn read_paths(arguments: &Value) -> Vec<&str> {
    if let Some(files) = arguments.get("files").and_then(Value::as_array) {
        return files
            .iter()
            .filter_map(|f| f.get("path").and_then(Value::as_str))
            .filter(|p| !p.is_empty())
            .collect();
    }
    arguments
        .get("path")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::{Governance, InMemoryGovernance};
    use crate::hook::types::TaskInfo;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(
        gov: &Arc<InMemoryGovernance>,
        cwd: &std::path::Path,
        tool: &str,
        args: Value,
    ) -> HookInvocationContext {
        HookInvocationContext::new(TaskInfo::new("t", cwd), gov.clone(), tool, args)
    }

    #[tokio::test]
    async fn test_read_then_write_unchanged_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();
        let gov = Arc::new(InMemoryGovernance::new());

        let read = ctx(&gov, dir.path(), "read_file", json!({"path": "a.txt"}));
        ConcurrencyPostHook.observe(&read).await.unwrap();
        assert_eq!(
            gov.read_hash(&dir.path().join("a.txt")),
            Some(sha256_hex(b"one"))
        );

        let write = ctx(&gov, dir.path(), "write_to_file", json!({"path": "a.txt", "content": "two"}));
        assert!(ConcurrencyPreHook.check(&write).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_write_denied() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "one").unwrap();
        let gov = Arc::new(InMemoryGovernance::new());

        let read = ctx(&gov, dir.path(), "read_file", json!({"files": [{"path": "a.txt"}]}));
        ConcurrencyPostHook.observe(&read).await.unwrap();

        std::fs::write(&file, "changed elsewhere").unwrap();
        let write = ctx(&gov, dir.path(), "apply_diff", json!({"path": "a.txt", "diff": ""}));
        let verdict = ConcurrencyPreHook.check(&write).await.unwrap().unwrap();
        assert!(!verdict.allow);
        assert!(verdict.denial_reason().contains("read_file"));
    }

    #[tokio::test]
    async fn test_stale_patch_target_denied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();
        let gov = Arc::new(InMemoryGovernance::new());

        let read = ctx(&gov, dir.path(), "read_file", json!({"path": "a.txt"}));
        ConcurrencyPostHook.observe(&read).await.unwrap();
        std::fs::write(dir.path().join("a.txt"), "changed elsewhere").unwrap();

        let patch = "*** Begin Patch\n*** Add File: b.txt\n+new\n*** Update File: a.txt\n@@\n-one\n+two\n*** End Patch";
        let write = ctx(&gov, dir.path(), "apply_patch", json!({ "patch": patch }));
        let verdict = ConcurrencyPreHook.check(&write).await.unwrap().unwrap();
        assert!(verdict.denial_reason().contains("'a.txt'"));
    }

    #[tokio::test]
    async fn test_failed_read_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();
        let gov = Arc::new(InMemoryGovernance::new());

        let mut read = ctx(&gov, dir.path(), "read_file", json!({"path": "a.txt"}));
        read.record_failure("permission denied");
        ConcurrencyPostHook.observe(&read).await.unwrap();
        assert!(gov.read_hash(&dir.path().join("a.txt")).is_none());
    }

    #[tokio::test]
    async fn test_unread_or_new_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let gov = Arc::new(InMemoryGovernance::new());
        let write = ctx(&gov, dir.path(), "write_to_file", json!({"path": "new.txt", "content": ""}));
        assert!(ConcurrencyPreHook.check(&write).await.unwrap().is_none());
    }
}
