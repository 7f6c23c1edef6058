//! Static tool catalog names and parameter vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 정적 카탈로그 도구 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ExecuteCommand,
    ReadFile,
    ReadCommandOutput,
    WriteToFile,
    ApplyDiff,
    Edit,
    SearchAndReplace,
    SearchReplace,
    EditFile,
    ApplyPatch,
    SearchFiles,
    ListFiles,
    UseMcpTool,
    AccessMcpResource,
    AskFollowupQuestion,
    AttemptCompletion,
    SwitchMode,
    NewTask,
    CodebaseSearch,
    UpdateTodoList,
    RunSlashCommand,
    Skill,
    GenerateImage,
    SelectActiveIntent,
    RecordLessonLearned,
}

impl ToolName {
    /// 카탈로그 전체
    pub const ALL: [ToolName; 25] = [
        ToolName::ExecuteCommand,
        ToolName::ReadFile,
        ToolName::ReadCommandOutput,
        ToolName::WriteToFile,
        ToolName::ApplyDiff,
        ToolName::Edit,
        ToolName::SearchAndReplace,
        ToolName::SearchReplace,
        ToolName::EditFile,
        ToolName::ApplyPatch,
        ToolName::SearchFiles,
        ToolName::ListFiles,
        ToolName::UseMcpTool,
        ToolName::AccessMcpResource,
        ToolName::AskFollowupQuestion,
        ToolName::AttemptCompletion,
        ToolName::SwitchMode,
        ToolName::NewTask,
        ToolName::CodebaseSearch,
        ToolName::UpdateTodoList,
        ToolName::RunSlashCommand,
        ToolName::Skill,
        ToolName::GenerateImage,
        ToolName::SelectActiveIntent,
        ToolName::RecordLessonLearned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ExecuteCommand => "execute_command",
            ToolName::ReadFile => "read_file",
            ToolName::ReadCommandOutput => "read_command_output",
            ToolName::WriteToFile => "write_to_file",
            ToolName::ApplyDiff => "apply_diff",
            ToolName::Edit => "edit",
            ToolName::SearchAndReplace => "search_and_replace",
            ToolName::SearchReplace => "search_replace",
            ToolName::EditFile => "edit_file",
            ToolName::ApplyPatch => "apply_patch",
            ToolName::SearchFiles => "search_files",
            ToolName::ListFiles => "list_files",
            ToolName::UseMcpTool => "use_mcp_tool",
            ToolName::AccessMcpResource => "access_mcp_resource",
            ToolName::AskFollowupQuestion => "ask_followup_question",
            ToolName::AttemptCompletion => "attempt_completion",
            ToolName::SwitchMode => "switch_mode",
            ToolName::NewTask => "new_task",
            ToolName::CodebaseSearch => "codebase_search",
            ToolName::UpdateTodoList => "update_todo_list",
            ToolName::RunSlashCommand => "run_slash_command",
            ToolName::Skill => "skill",
            ToolName::GenerateImage => "generate_image",
            ToolName::SelectActiveIntent => "select_active_intent",
            ToolName::RecordLessonLearned => "record_lesson_learned",
        }
    }

    /// 이름으로 조회 (별칭 미적용)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// 워크스페이스 파일을 변경하는 도구
    pub fn is_file_mutation(&self) -> bool {
        matches!(
            self,
            ToolName::WriteToFile
                | ToolName::ApplyDiff
                | ToolName::Edit
                | ToolName::SearchAndReplace
                | ToolName::SearchReplace
                | ToolName::EditFile
                | ToolName::ApplyPatch
                | ToolName::GenerateImage
        )
    }

    /// 거버넌스 관점에서 파괴적일 수 있는 도구
    pub fn is_destructive(&self) -> bool {
        *self == ToolName::ExecuteCommand || (self.is_file_mutation() && *self != ToolName::GenerateImage)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = warden_foundation::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| warden_foundation::Error::ToolNotFound(s.to_string()))
    }
}

/// 인식되는 파라미터 이름 (표시용 파라미터 필터)
pub const PARAM_NAMES: &[&str] = &[
    "command",
    "path",
    "content",
    "regex",
    "file_pattern",
    "recursive",
    "action",
    "url",
    "coordinate",
    "text",
    "server_name",
    "tool_name",
    "arguments",
    "uri",
    "question",
    "result",
    "diff",
    "mode_slug",
    "reason",
    "line",
    "mode",
    "message",
    "cwd",
    "follow_up",
    "task",
    "size",
    "query",
    "args",
    "skill",
    "start_line",
    "end_line",
    "todos",
    "prompt",
    "image",
    "operations",
    "patch",
    "file_path",
    "old_string",
    "new_string",
    "replace_all",
    "expected_replacements",
    "artifact_id",
    "search",
    "offset",
    "limit",
    "indentation",
    "anchor_line",
    "max_levels",
    "include_siblings",
    "include_header",
    "max_lines",
    "files",
    "line_ranges",
    "intent_id",
    "lesson",
];

/// 파라미터 이름이 어휘에 포함되는지 확인
pub fn is_known_param(name: &str) -> bool {
    PARAM_NAMES.contains(&name)
}
