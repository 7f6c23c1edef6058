//! Hook 타입 정의
//!
//! Pre-hooks may veto a tool invocation, post-hooks only observe it. Both
//! see the same [`HookInvocationContext`], which is filled with the outcome
//! after the handler ran.

use crate::governance::Governance;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use warden_foundation::Result;

/// 거부 사유가 없을 때 사용하는 기본 메시지
pub const DEFAULT_DENIAL_REASON: &str = "Access denied by hook engine";

/// `apply_patch` 본문의 파일 헤더
const PATCH_FILE_HEADERS: &[&str] = &[
    "*** Add File: ",
    "*** Update File: ",
    "*** Delete File: ",
    "*** Move to: ",
];

// ============================================================================
// TaskInfo
// ============================================================================

/// Hook에 노출되는 태스크 정보
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub task_id: String,
    /// 작업 디렉토리 (상대 경로 해석 기준)
    pub cwd: PathBuf,
    pub model_id: Option<String>,
}

impl TaskInfo {
    pub fn new(task_id: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            task_id: task_id.into(),
            cwd: cwd.into(),
            model_id: None,
        }
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

// ============================================================================
// HookInvocationContext
// ============================================================================

/// 도구 호출 하나에 대한 Hook 컨텍스트
#[derive(Clone)]
pub struct HookInvocationContext {
    pub task: TaskInfo,
    pub governance: Arc<dyn Governance>,
    /// 정규화된 도구 이름
    pub tool_name: String,
    pub call_id: Option<String>,
    pub arguments: Value,
    pub active_scope_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// 실행 결과 (post 단계)
    pub result: Option<String>,
    /// 실행 에러 (post 단계)
    pub error: Option<String>,
}

impl HookInvocationContext {
    /// 새 컨텍스트 (활성 범위는 거버넌스에서 조회)
    pub fn new(
        task: TaskInfo,
        governance: Arc<dyn Governance>,
        tool_name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        let active_scope_id = governance.active_scope_id();
        Self {
            task,
            governance,
            tool_name: tool_name.into(),
            call_id: None,
            arguments,
            active_scope_id,
            timestamp: Utc::now(),
            result: None,
            error: None,
        }
    }

    pub fn with_call_id(mut self, call_id: Option<String>) -> Self {
        self.call_id = call_id;
        self
    }

    /// 문자열 인자 조회
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// 대상 파일 경로 목록
    ///
    /// `path` or `file_path` when present; otherwise every file named by the
    /// `*** Add/Update/Delete File:` and `*** Move to:` headers of a `patch`.
    pub fn target_paths(&self) -> Vec<&str> {
        if let Some(path) = self
            .arg_str("path")
            .or_else(|| self.arg_str("file_path"))
            .filter(|p| !p.is_empty())
        {
            return vec![path];
        }
        self.arg_str("patch").map(patch_paths).unwrap_or_default()
    }

    /// cwd 기준 절대 경로
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        self.task.cwd.join(path)
    }

    pub fn record_success(&mut self, result: impl Into<String>) {
        self.result = Some(result.into());
        self.error = None;
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// 패치 헤더에 적힌 파일 경로
fn patch_paths(patch: &str) -> Vec<&str> {
    let mut paths = Vec::new();
    for line in patch.lines() {
        let Some(path) = PATCH_FILE_HEADERS
            .iter()
            .find_map(|header| line.trim_start().strip_prefix(header))
            .map(str::trim)
            .filter(|p| !p.is_empty())
        else {
            continue;
        };
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

impl std::fmt::Debug for HookInvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookInvocationContext")
            .field("task", &self.task)
            .field("tool_name", &self.tool_name)
            .field("call_id", &self.call_id)
            .field("arguments", &self.arguments)
            .field("active_scope_id", &self.active_scope_id)
            .field("timestamp", &self.timestamp)
            .field("result", &self.result)
            .field("error", &self.error)
            .finish()
    }
}

// ============================================================================
// HookVerdict
// ============================================================================

/// Pre-hook 판정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookVerdict {
    pub allow: bool,
    pub reason: Option<String>,
}

impl HookVerdict {
    pub fn allow() -> Self {
        Self {
            allow: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            reason: Some(reason.into()),
        }
    }

    /// 거부 사유 (없으면 기본 메시지)
    pub fn denial_reason(&self) -> &str {
        self.reason
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_DENIAL_REASON)
    }
}

// ============================================================================
// Hook traits
// ============================================================================

/// 실행 전 Hook (거부 가능)
#[async_trait]
pub trait PreToolHook: Send + Sync {
    fn name(&self) -> &str;

    /// `None` 또는 allow 판정이면 통과
    async fn check(&self, ctx: &HookInvocationContext) -> Result<Option<HookVerdict>>;
}

/// 실행 후 Hook (관찰만)
#[async_trait]
pub trait PostToolHook: Send + Sync {
    fn name(&self) -> &str;

    async fn observe(&self, ctx: &HookInvocationContext) -> Result<()>;
}
