//! Typed tool arguments
//!
//! One execution-ready argument struct per catalog tool. Values are built
//! from the normalized argument map produced by the tool descriptor.

use super::names::ToolName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Argument Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteCommandArgs {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

/// 줄 범위 (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u64,
    pub end: u64,
}

/// 레거시 다중 파일 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_ranges: Vec<LineRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndentationArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_line: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_levels: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_siblings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_header: Option<bool>,
}

/// 단일 경로 `read_file` 인자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFilePathArgs {
    pub path: String,
    /// "slice" 또는 "indentation"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indentation: Option<IndentationArgs>,
}

/// `read_file` 인자 (레거시 다중 파일 / 단일 경로)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReadFileArgs {
    Files { files: Vec<FileEntry> },
    Path(ReadFilePathArgs),
}

impl ReadFileArgs {
    /// 읽을 경로 목록
    pub fn paths(&self) -> Vec<&str> {
        match self {
            ReadFileArgs::Files { files } => files.iter().map(|f| f.path.as_str()).collect(),
            ReadFileArgs::Path(args) => vec![args.path.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCommandOutputArgs {
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteToFileArgs {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyDiffArgs {
    pub path: String,
    pub diff: String,
}

/// `edit` / `search_and_replace` 인자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditArgs {
    pub file_path: String,
    pub old_string: String,
    pub new_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_all: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReplaceArgs {
    pub file_path: String,
    pub old_string: String,
    pub new_string: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditFileArgs {
    pub file_path: String,
    pub old_string: String,
    pub new_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_replacements: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyPatchArgs {
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilesArgs {
    pub path: String,
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilesArgs {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseMcpToolArgs {
    pub server_name: String,
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMcpResourceArgs {
    pub server_name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpSuggestion {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskFollowupQuestionArgs {
    pub question: String,
    pub follow_up: Vec<FollowUpSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptCompletionArgs {
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchModeArgs {
    pub mode_slug: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaskArgs {
    pub mode: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todos: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebaseSearchArgs {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodoListArgs {
    pub todos: String,
}

/// `run_slash_command` / `skill` 공통 형태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSlashCommandArgs {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillArgs {
    pub skill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateImageArgs {
    pub prompt: String,
    pub path: String,
    /// 편집할 입력 이미지 경로
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectActiveIntentArgs {
    pub intent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLessonLearnedArgs {
    pub lesson: String,
}

// ============================================================================
// NativeArgs
// ============================================================================

/// 실행 가능한 카탈로그 도구 인자
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NativeArgs {
    ExecuteCommand(ExecuteCommandArgs),
    ReadFile(ReadFileArgs),
    ReadCommandOutput(ReadCommandOutputArgs),
    WriteToFile(WriteToFileArgs),
    ApplyDiff(ApplyDiffArgs),
    Edit(EditArgs),
    SearchReplace(SearchReplaceArgs),
    EditFile(EditFileArgs),
    ApplyPatch(ApplyPatchArgs),
    SearchFiles(SearchFilesArgs),
    ListFiles(ListFilesArgs),
    UseMcpTool(UseMcpToolArgs),
    AccessMcpResource(AccessMcpResourceArgs),
    AskFollowupQuestion(AskFollowupQuestionArgs),
    AttemptCompletion(AttemptCompletionArgs),
    SwitchMode(SwitchModeArgs),
    NewTask(NewTaskArgs),
    CodebaseSearch(CodebaseSearchArgs),
    UpdateTodoList(UpdateTodoListArgs),
    RunSlashCommand(RunSlashCommandArgs),
    Skill(SkillArgs),
    GenerateImage(GenerateImageArgs),
    SelectActiveIntent(SelectActiveIntentArgs),
    RecordLessonLearned(RecordLessonLearnedArgs),
}

impl NativeArgs {
    /// 정규화된 인자 맵에서 도구별 구조체 생성
    ///
    /// `read_file` is handled by the resolver because of its two forms.
    pub(crate) fn from_fields(
        tool: ToolName,
        fields: Map<String, Value>,
    ) -> serde_json::Result<Self> {
        let value = Value::Object(fields);
        Ok(match tool {
            ToolName::ExecuteCommand => NativeArgs::ExecuteCommand(serde_json::from_value(value)?),
            ToolName::ReadFile => NativeArgs::ReadFile(ReadFileArgs::Path(serde_json::from_value(value)?)),
            ToolName::ReadCommandOutput => {
                NativeArgs::ReadCommandOutput(serde_json::from_value(value)?)
            }
            ToolName::WriteToFile => NativeArgs::WriteToFile(serde_json::from_value(value)?),
            ToolName::ApplyDiff => NativeArgs::ApplyDiff(serde_json::from_value(value)?),
            ToolName::Edit | ToolName::SearchAndReplace => {
                NativeArgs::Edit(serde_json::from_value(value)?)
            }
            ToolName::SearchReplace => NativeArgs::SearchReplace(serde_json::from_value(value)?),
            ToolName::EditFile => NativeArgs::EditFile(serde_json::from_value(value)?),
            ToolName::ApplyPatch => NativeArgs::ApplyPatch(serde_json::from_value(value)?),
            ToolName::SearchFiles => NativeArgs::SearchFiles(serde_json::from_value(value)?),
            ToolName::ListFiles => NativeArgs::ListFiles(serde_json::from_value(value)?),
            ToolName::UseMcpTool => NativeArgs::UseMcpTool(serde_json::from_value(value)?),
            ToolName::AccessMcpResource => {
                NativeArgs::AccessMcpResource(serde_json::from_value(value)?)
            }
            ToolName::AskFollowupQuestion => {
                NativeArgs::AskFollowupQuestion(serde_json::from_value(value)?)
            }
            ToolName::AttemptCompletion => {
                NativeArgs::AttemptCompletion(serde_json::from_value(value)?)
            }
            ToolName::SwitchMode => NativeArgs::SwitchMode(serde_json::from_value(value)?),
            ToolName::NewTask => NativeArgs::NewTask(serde_json::from_value(value)?),
            ToolName::CodebaseSearch => NativeArgs::CodebaseSearch(serde_json::from_value(value)?),
            ToolName::UpdateTodoList => NativeArgs::UpdateTodoList(serde_json::from_value(value)?),
            ToolName::RunSlashCommand => {
                NativeArgs::RunSlashCommand(serde_json::from_value(value)?)
            }
            ToolName::Skill => NativeArgs::Skill(serde_json::from_value(value)?),
            ToolName::GenerateImage => NativeArgs::GenerateImage(serde_json::from_value(value)?),
            ToolName::SelectActiveIntent => {
                NativeArgs::SelectActiveIntent(serde_json::from_value(value)?)
            }
            ToolName::RecordLessonLearned => {
                NativeArgs::RecordLessonLearned(serde_json::from_value(value)?)
            }
        })
    }

    /// JSON 값으로 변환 (Hook 컨텍스트용)
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// 파일을 대상으로 하는 도구의 경로
    pub fn target_path(&self) -> Option<&str> {
        match self {
            NativeArgs::WriteToFile(a) => Some(&a.path),
            NativeArgs::ApplyDiff(a) => Some(&a.path),
            NativeArgs::Edit(a) => Some(&a.file_path),
            NativeArgs::SearchReplace(a) => Some(&a.file_path),
            NativeArgs::EditFile(a) => Some(&a.file_path),
            NativeArgs::GenerateImage(a) => Some(&a.path),
            NativeArgs::ReadFile(ReadFileArgs::Path(a)) => Some(&a.path),
            NativeArgs::ListFiles(a) => Some(&a.path),
            NativeArgs::SearchFiles(a) => Some(&a.path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_fields_write() {
        let args = NativeArgs::from_fields(
            ToolName::WriteToFile,
            fields(json!({"path": "a.txt", "content": "x"})),
        )
        .unwrap();
        assert_eq!(
            args,
            NativeArgs::WriteToFile(WriteToFileArgs {
                path: "a.txt".into(),
                content: "x".into()
            })
        );
        assert_eq!(args.target_path(), Some("a.txt"));
        assert_eq!(args.to_value(), json!({"path": "a.txt", "content": "x"}));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let result = NativeArgs::from_fields(ToolName::ApplyDiff, fields(json!({"path": "a"})));
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_shared_by_search_and_replace() {
        let args = NativeArgs::from_fields(
            ToolName::SearchAndReplace,
            fields(json!({"file_path": "f", "old_string": "a", "new_string": "b", "replace_all": true})),
        )
        .unwrap();
        assert!(matches!(args, NativeArgs::Edit(EditArgs { replace_all: Some(true), .. })));
    }

    #[test]
    fn test_read_file_serialization() {
        let legacy = ReadFileArgs::Files {
            files: vec![FileEntry {
                path: "a.rs".into(),
                line_ranges: vec![LineRange { start: 1, end: 2 }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&legacy).unwrap(),
            json!({"files": [{"path": "a.rs", "line_ranges": [{"start": 1, "end": 2}]}]})
        );
        assert_eq!(legacy.paths(), vec!["a.rs"]);
    }
}
