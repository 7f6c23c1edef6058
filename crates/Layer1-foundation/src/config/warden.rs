//! Warden Config - 실행 코어 설정
//!
//! 모드, 도구 허용 목록, 반복 제한, Hook 설정을 관리

use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 설정 파일명
pub const WARDEN_CONFIG_FILE: &str = "config.json";

/// 기본 모드
pub const DEFAULT_MODE: &str = "code";

/// 연속 동일 호출 기본 제한
pub const DEFAULT_REPETITION_LIMIT: u32 = 3;

// ============================================================================
// Warden Config
// ============================================================================

/// Warden 통합 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardenConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 현재 모드 slug
    #[serde(default = "default_mode")]
    pub mode: String,

    /// 비활성화된 도구
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_tools: Vec<String>,

    /// 허용 목록 (비어 있으면 제한 없음)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_tools: Vec<String>,

    /// 커스텀 도구 사용 여부
    #[serde(default = "default_true")]
    pub custom_tools_enabled: bool,

    /// 추가 도구 별칭 (alias -> canonical)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tool_aliases: BTreeMap<String, String>,

    /// 연속 동일 호출 제한 (0 = 비활성화)
    #[serde(default = "default_repetition_limit")]
    pub repetition_limit: u32,

    /// Hook 설정
    #[serde(default)]
    pub hooks: HookSettings,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            mode: default_mode(),
            disabled_tools: Vec::new(),
            included_tools: Vec::new(),
            custom_tools_enabled: true,
            tool_aliases: BTreeMap::new(),
            repetition_limit: DEFAULT_REPETITION_LIMIT,
            hooks: HookSettings::default(),
        }
    }
}

impl WardenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<WardenConfig>(WARDEN_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) =
                project.load_optional::<WardenConfig>(WARDEN_CONFIG_FILE)?
            {
                config.merge(project_config);
            }
        }

        tracing::debug!(mode = %config.mode, "Loaded warden config");
        Ok(config)
    }

    /// 지정된 프로젝트 루트의 설정만 로드
    pub fn load_project(root: impl AsRef<Path>) -> Result<Self> {
        let store = JsonStore::project(root.as_ref());
        Ok(store
            .load_optional::<WardenConfig>(WARDEN_CONFIG_FILE)?
            .unwrap_or_default())
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self, root: impl AsRef<Path>) -> Result<()> {
        JsonStore::project(root.as_ref()).save(WARDEN_CONFIG_FILE, self)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: WardenConfig) {
        if other.mode != default_mode() {
            self.mode = other.mode;
        }
        for tool in other.disabled_tools {
            if !self.disabled_tools.contains(&tool) {
                self.disabled_tools.push(tool);
            }
        }
        if !other.included_tools.is_empty() {
            self.included_tools = other.included_tools;
        }
        self.custom_tools_enabled = other.custom_tools_enabled;
        self.tool_aliases.extend(other.tool_aliases);
        if other.repetition_limit != DEFAULT_REPETITION_LIMIT {
            self.repetition_limit = other.repetition_limit;
        }
        self.hooks.merge(other.hooks);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_disabled_tool(mut self, tool: impl Into<String>) -> Self {
        self.disabled_tools.push(tool.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.tool_aliases.insert(alias.into(), canonical.into());
        self
    }

    pub fn with_repetition_limit(mut self, limit: u32) -> Self {
        self.repetition_limit = limit;
        self
    }
}

// ============================================================================
// Hook Settings
// ============================================================================

/// 내장 Hook 활성화 및 실패 정책
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSettings {
    /// Pre-hook 실패 시 거부로 처리
    #[serde(default = "default_true")]
    pub fail_closed: bool,

    #[serde(default = "default_true")]
    pub intent_validation: bool,

    #[serde(default = "default_true")]
    pub scope_enforcement: bool,

    /// 읽기 해시 기반 낙관적 잠금
    #[serde(default = "default_true")]
    pub concurrency_guard: bool,

    /// .orchestration/agent_trace.jsonl 기록
    #[serde(default = "default_true")]
    pub trace_logging: bool,

    /// 검증 실패 시 AGENTS.md에 교훈 기록
    #[serde(default)]
    pub verification_lessons: bool,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            fail_closed: true,
            intent_validation: true,
            scope_enforcement: true,
            concurrency_guard: true,
            trace_logging: true,
            verification_lessons: false,
        }
    }
}

impl HookSettings {
    fn merge(&mut self, other: HookSettings) {
        self.fail_closed = other.fail_closed;
        self.intent_validation = other.intent_validation;
        self.scope_enforcement = other.scope_enforcement;
        self.concurrency_guard = other.concurrency_guard;
        self.trace_logging = other.trace_logging;
        self.verification_lessons = other.verification_lessons;
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn default_version() -> u32 {
    1
}

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}

fn default_repetition_limit() -> u32 {
    DEFAULT_REPETITION_LIMIT
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warden_config_default() {
        let config = WardenConfig::new();
        assert_eq!(config.version, 1);
        assert_eq!(config.mode, "code");
        assert_eq!(config.repetition_limit, 3);
        assert!(config.custom_tools_enabled);
        assert!(config.hooks.fail_closed);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: WardenConfig = serde_json::from_str(
            r#"{"mode":"architect","toolAliases":{"bash":"execute_command"},"hooks":{"traceLogging":false}}"#,
        )
        .unwrap();
        assert_eq!(config.mode, "architect");
        assert_eq!(config.repetition_limit, 3);
        assert_eq!(
            config.tool_aliases.get("bash").map(String::as_str),
            Some("execute_command")
        );
        assert!(!config.hooks.trace_logging);
        assert!(config.hooks.fail_closed);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = WardenConfig::new().with_disabled_tool("apply_patch");
        let other = WardenConfig::new()
            .with_mode("ask")
            .with_disabled_tool("generate_image")
            .with_repetition_limit(5)
            .with_alias("run", "execute_command");

        base.merge(other);
        assert_eq!(base.mode, "ask");
        assert_eq!(base.repetition_limit, 5);
        assert_eq!(base.disabled_tools, vec!["apply_patch", "generate_image"]);
        assert!(base.tool_aliases.contains_key("run"));
    }

    #[test]
    fn test_project_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = WardenConfig::new().with_mode("debug");
        config.save_project(dir.path()).unwrap();

        let loaded = WardenConfig::load_project(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
