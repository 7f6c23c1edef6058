//! Tool use validation - 모드/그룹 정책 검사
//!
//! A complete call is checked against the current mode's capability
//! groups, the disabled list and the included-tools allowlist before any
//! hook or handler sees it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use warden_core::{ToolCatalog, ToolIdent, ToolName, ToolUse};
use warden_foundation::WardenConfig;

/// 검증 실패 사유
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown tool \"{0}\". This tool does not exist. Please use one of the available tools.")]
    UnknownTool(String),

    #[error("Tool \"{0}\" is disabled.")]
    Disabled(String),

    #[error("Tool \"{0}\" is not included in the tools available to this model.")]
    NotIncluded(String),

    #[error("Tool \"{tool}\" is not allowed in {mode} mode.")]
    NotAllowedInMode { tool: String, mode: String },

    #[error("This mode ({mode}) can only edit files matching pattern: {pattern}. Got: {path}")]
    FileRestriction {
        mode: String,
        pattern: String,
        path: String,
    },

    #[error("Missing value for required parameter '{param}' of tool \"{tool}\".")]
    MissingParameter { tool: String, param: String },

    #[error("Unknown mode \"{0}\".")]
    UnknownMode(String),
}

impl From<ValidationError> for warden_foundation::Error {
    fn from(e: ValidationError) -> Self {
        warden_foundation::Error::Validation(e.to_string())
    }
}

// ============================================================================
// Groups & Modes
// ============================================================================

/// 도구 그룹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolGroup {
    Read,
    Edit,
    Command,
    Mcp,
    Modes,
}

impl ToolGroup {
    pub const ALL: [ToolGroup; 5] = [
        ToolGroup::Read,
        ToolGroup::Edit,
        ToolGroup::Command,
        ToolGroup::Mcp,
        ToolGroup::Modes,
    ];

    /// 그룹에 속한 도구
    pub fn tools(&self) -> &'static [ToolName] {
        match self {
            ToolGroup::Read => &[
                ToolName::ReadFile,
                ToolName::SearchFiles,
                ToolName::ListFiles,
                ToolName::CodebaseSearch,
            ],
            ToolGroup::Edit => &[
                ToolName::ApplyDiff,
                ToolName::WriteToFile,
                ToolName::GenerateImage,
                ToolName::Edit,
                ToolName::SearchAndReplace,
                ToolName::SearchReplace,
                ToolName::EditFile,
                ToolName::ApplyPatch,
            ],
            ToolGroup::Command => &[ToolName::ExecuteCommand, ToolName::ReadCommandOutput],
            ToolGroup::Mcp => &[ToolName::UseMcpTool, ToolName::AccessMcpResource],
            ToolGroup::Modes => &[ToolName::SwitchMode, ToolName::NewTask],
        }
    }

    pub fn contains(&self, tool: ToolName) -> bool {
        self.tools().contains(&tool)
    }
}

/// 모든 모드에서 항상 사용 가능한 도구
pub const ALWAYS_AVAILABLE_TOOLS: &[ToolName] = &[
    ToolName::AskFollowupQuestion,
    ToolName::AttemptCompletion,
    ToolName::SwitchMode,
    ToolName::NewTask,
    ToolName::UpdateTodoList,
    ToolName::RunSlashCommand,
    ToolName::Skill,
    ToolName::SelectActiveIntent,
    ToolName::RecordLessonLearned,
];

/// 모드에 허용된 그룹 (선택적 파일 제한)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    pub group: ToolGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_regex: Option<String>,
}

impl GroupEntry {
    pub fn new(group: ToolGroup) -> Self {
        Self {
            group,
            file_regex: None,
        }
    }

    pub fn with_file_regex(mut self, pattern: impl Into<String>) -> Self {
        self.file_regex = Some(pattern.into());
        self
    }
}

/// 모드 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfig {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

impl ModeConfig {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, entry: GroupEntry) -> Self {
        self.groups.push(entry);
        self
    }

    fn all_groups(self) -> Self {
        ToolGroup::ALL
            .iter()
            .fold(self, |mode, group| mode.with_group(GroupEntry::new(*group)))
    }
}

/// 내장 모드
pub fn builtin_modes() -> Vec<ModeConfig> {
    vec![
        ModeConfig::new("code", "💻 Code").all_groups(),
        ModeConfig::new("architect", "🏗️ Architect")
            .with_group(GroupEntry::new(ToolGroup::Read))
            .with_group(GroupEntry::new(ToolGroup::Edit).with_file_regex(r"\.md$"))
            .with_group(GroupEntry::new(ToolGroup::Mcp)),
        ModeConfig::new("ask", "❓ Ask")
            .with_group(GroupEntry::new(ToolGroup::Read))
            .with_group(GroupEntry::new(ToolGroup::Mcp)),
        ModeConfig::new("debug", "🪲 Debug").all_groups(),
        ModeConfig::new("orchestrator", "🪃 Orchestrator"),
    ]
}

// ============================================================================
// ValidationPolicy
// ============================================================================

/// 도구 사용 검증 정책
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    mode: String,
    modes: Vec<ModeConfig>,
    disabled: HashSet<String>,
    included: Option<HashSet<String>>,
}

impl ValidationPolicy {
    /// 기본 정책 (code 모드, 제한 없음)
    pub fn new() -> Self {
        Self {
            mode: warden_foundation::DEFAULT_MODE.to_string(),
            modes: builtin_modes(),
            disabled: HashSet::new(),
            included: None,
        }
    }

    /// 설정에서 정책 생성 (별칭은 정식 이름으로 변환)
    pub fn from_config(config: &WardenConfig, catalog: &ToolCatalog) -> Self {
        let mut disabled = HashSet::new();
        for tool in &config.disabled_tools {
            disabled.insert(tool.clone());
            disabled.insert(catalog.resolve_alias(tool).to_string());
        }

        let included = (!config.included_tools.is_empty()).then(|| {
            config
                .included_tools
                .iter()
                .map(|tool| catalog.resolve_alias(tool).to_string())
                .collect()
        });

        Self {
            mode: config.mode.clone(),
            modes: builtin_modes(),
            disabled,
            included,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// 커스텀 모드 추가 (같은 slug면 교체)
    pub fn with_custom_mode(mut self, mode: ModeConfig) -> Self {
        self.modes.retain(|m| m.slug != mode.slug);
        self.modes.push(mode);
        self
    }

    pub fn with_disabled(mut self, tool: impl Into<String>) -> Self {
        self.disabled.insert(tool.into());
        self
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// 모드 전환 (알 수 없는 모드는 거부)
    pub fn set_mode(&mut self, mode: impl Into<String>) -> Result<(), ValidationError> {
        let mode = mode.into();
        if self.find_mode(&mode).is_none() {
            return Err(ValidationError::UnknownMode(mode));
        }
        self.mode = mode;
        Ok(())
    }

    pub fn find_mode(&self, slug: &str) -> Option<&ModeConfig> {
        self.modes.iter().find(|m| m.slug == slug)
    }

    /// 완료된 도구 호출 검증
    pub fn validate(&self, call: &ToolUse) -> Result<(), ValidationError> {
        let name = call.name.as_str();

        let tool = match &call.name {
            ToolIdent::Catalog(tool) => *tool,
            ToolIdent::Custom(_) => {
                if self.disabled.contains(name) {
                    return Err(ValidationError::Disabled(name.to_string()));
                }
                return Ok(());
            }
            ToolIdent::Unknown(_) => return Err(ValidationError::UnknownTool(name.to_string())),
        };

        if ALWAYS_AVAILABLE_TOOLS.contains(&tool) {
            return Ok(());
        }

        let disabled_as_sent = call
            .original_name
            .as_deref()
            .is_some_and(|original| self.disabled.contains(original));
        if self.disabled.contains(name) || disabled_as_sent {
            return Err(ValidationError::Disabled(name.to_string()));
        }

        if let Some(included) = &self.included {
            if !included.contains(name) {
                return Err(ValidationError::NotIncluded(name.to_string()));
            }
        }

        let mode = self
            .find_mode(&self.mode)
            .ok_or_else(|| ValidationError::UnknownMode(self.mode.clone()))?;

        let entry = mode
            .groups
            .iter()
            .find(|entry| entry.group.contains(tool))
            .ok_or_else(|| ValidationError::NotAllowedInMode {
                tool: name.to_string(),
                mode: mode.slug.clone(),
            })?;

        if let Some(pattern) = &entry.file_regex {
            check_file_restriction(call, tool, mode, pattern)?;
        }
        Ok(())
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new()
    }
}

fn check_file_restriction(
    call: &ToolUse,
    tool: ToolName,
    mode: &ModeConfig,
    pattern: &str,
) -> Result<(), ValidationError> {
    // apply_patch는 여러 파일을 패치 본문에 담으므로 경로 파라미터가 없음
    if tool == ToolName::ApplyPatch {
        return Ok(());
    }

    let path = call
        .native_args()
        .and_then(|args| args.target_path())
        .or_else(|| call.params.get("path").map(String::as_str))
        .or_else(|| call.params.get("file_path").map(String::as_str))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ValidationError::MissingParameter {
            tool: tool.as_str().to_string(),
            param: "path".to_string(),
        })?;

    let matches = match Regex::new(pattern) {
        Ok(re) => re.is_match(path),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "Invalid file restriction pattern");
            false
        }
    };

    if matches {
        Ok(())
    } else {
        Err(ValidationError::FileRestriction {
            mode: mode.name.clone(),
            pattern: pattern.to_string(),
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_core::{CustomToolRegistry, RawToolCall, ResolvedToolCall, ToolCallResolver};

    fn resolve(name: &str, args: &str) -> ToolUse {
        let resolver = ToolCallResolver::new(
            Arc::new(ToolCatalog::new()),
            Arc::new(CustomToolRegistry::new()),
        );
        match resolver.try_resolve(&RawToolCall::new("c1", name, args)).unwrap() {
            ResolvedToolCall::ToolUse(t) => t,
            ResolvedToolCall::Dynamic(_) => panic!("expected tool use"),
        }
    }

    #[test]
    fn test_code_mode_allows_everything() {
        let policy = ValidationPolicy::new();
        assert!(policy.validate(&resolve("execute_command", r#"{"command":"ls"}"#)).is_ok());
        assert!(policy
            .validate(&resolve("write_to_file", r#"{"path":"a.rs","content":"x"}"#))
            .is_ok());
    }

    #[test]
    fn test_ask_mode_blocks_edit() {
        let policy = ValidationPolicy::new().with_mode("ask");
        let err = policy
            .validate(&resolve("write_to_file", r#"{"path":"a.rs","content":"x"}"#))
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowedInMode { .. }));
        assert!(err.to_string().contains("not allowed in ask mode"));

        // 항상 사용 가능한 도구
        assert!(policy
            .validate(&resolve("attempt_completion", r#"{"result":"done"}"#))
            .is_ok());
    }

    #[test]
    fn test_architect_file_restriction() {
        let policy = ValidationPolicy::new().with_mode("architect");
        assert!(policy
            .validate(&resolve("write_to_file", r#"{"path":"docs/plan.md","content":"x"}"#))
            .is_ok());

        let err = policy
            .validate(&resolve("write_to_file", r#"{"path":"src/main.rs","content":"x"}"#))
            .unwrap_err();
        assert!(matches!(err, ValidationError::FileRestriction { .. }));
        assert!(err.to_string().contains("src/main.rs"));
    }

    #[test]
    fn test_disabled_by_alias() {
        let config = WardenConfig {
            disabled_tools: vec!["write_file".into()],
            ..WardenConfig::default()
        };
        let catalog = ToolCatalog::new();
        let policy = ValidationPolicy::from_config(&config, &catalog);
        let err = policy
            .validate(&resolve("write_to_file", r#"{"path":"a","content":"x"}"#))
            .unwrap_err();
        assert_eq!(err, ValidationError::Disabled("write_to_file".into()));
    }

    #[test]
    fn test_included_allowlist() {
        let config = WardenConfig {
            included_tools: vec!["read_file".into()],
            ..WardenConfig::default()
        };
        let policy = ValidationPolicy::from_config(&config, &ToolCatalog::new());
        assert!(policy.validate(&resolve("read_file", r#"{"path":"a"}"#)).is_ok());
        assert!(matches!(
            policy.validate(&resolve("execute_command", r#"{"command":"ls"}"#)),
            Err(ValidationError::NotIncluded(_))
        ));
    }

    #[test]
    fn test_unknown_mode() {
        let policy = ValidationPolicy::new().with_mode("nope");
        assert_eq!(
            policy.validate(&resolve("read_file", r#"{"path":"a"}"#)),
            Err(ValidationError::UnknownMode("nope".into()))
        );

        let mut policy = ValidationPolicy::new();
        assert!(policy.set_mode("nope").is_err());
        assert!(policy.set_mode("debug").is_ok());
        assert_eq!(policy.mode(), "debug");
    }

    #[test]
    fn test_custom_mode() {
        let policy = ValidationPolicy::new()
            .with_custom_mode(
                ModeConfig::new("reviewer", "Reviewer").with_group(GroupEntry::new(ToolGroup::Read)),
            )
            .with_mode("reviewer");
        assert!(policy.validate(&resolve("list_files", r#"{"path":"."}"#)).is_ok());
        assert!(policy
            .validate(&resolve("execute_command", r#"{"command":"ls"}"#))
            .is_err());
    }
}
