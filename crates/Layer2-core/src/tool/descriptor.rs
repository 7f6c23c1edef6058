//! Tool descriptor dispatch table
//!
//! Each catalog tool is described by its fields (required or optional,
//! with a coercion kind) and a display formatter. The resolver and the
//! orchestrator consult this table instead of branching per tool.

use super::coerce;
use super::names::ToolName;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 표시용 파라미터 (이름 -> 문자열)
pub type DisplayParams = BTreeMap<String, String>;

/// 필드 값 변환 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 문자열 (스칼라는 문자열로 변환)
    Text,
    /// 음이 아닌 정수
    Count,
    /// 불리언
    Flag,
    /// 임의 JSON (JSON 문자열이면 파싱)
    Json,
    /// 레거시 `read_file` 파일 목록
    FileEntries,
    /// `read_file` 들여쓰기 옵션
    Indentation,
    /// 후속 질문 제안 목록
    FollowUps,
}

/// 필드 필수 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// 필수이며 빈 문자열 불가
    NonEmpty,
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
}

const fn req(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
        presence: Presence::Required,
    }
}

const fn non_empty(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
        presence: Presence::NonEmpty,
    }
}

const fn req_as(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        presence: Presence::Required,
    }
}

const fn opt(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        presence: Presence::Optional,
    }
}

/// 도구 설명자
pub struct ToolDescriptor {
    pub name: ToolName,
    pub fields: &'static [FieldSpec],
    display: fn(&str, &DisplayParams) -> String,
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    /// 필수 필드 이름
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.presence != Presence::Optional)
            .map(|f| f.name)
    }

    /// 알려진 필드만 변환하여 정규화된 맵 생성
    ///
    /// Null values count as absent; values that fail coercion are dropped.
    pub fn normalize(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for spec in self.fields {
            let Some(value) = raw.get(spec.name).filter(|v| !v.is_null()) else {
                continue;
            };
            match coerce_field(spec.kind, value) {
                Some(coerced) => {
                    out.insert(spec.name.to_string(), coerced);
                }
                None => {
                    tracing::debug!(
                        tool = %self.name,
                        field = spec.name,
                        "Dropping argument that could not be coerced"
                    );
                }
            }
        }
        out
    }

    /// 정규화된 맵에서 누락된 필수 필드
    pub fn missing_required(&self, normalized: &Map<String, Value>) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|spec| match spec.presence {
                Presence::Optional => false,
                Presence::Required => !normalized.contains_key(spec.name),
                Presence::NonEmpty => !matches!(
                    normalized.get(spec.name),
                    Some(Value::String(s)) if !s.is_empty()
                ),
            })
            .map(|spec| spec.name)
            .collect()
    }

    /// 사람이 읽을 수 있는 호출 설명 (예: `[execute_command for 'ls']`)
    pub fn describe(&self, params: &DisplayParams) -> String {
        (self.display)(self.name.as_str(), params)
    }
}

fn coerce_field(kind: FieldKind, value: &Value) -> Option<Value> {
    match kind {
        FieldKind::Text => coerce::coerce_text(value).map(Value::String),
        FieldKind::Count => coerce::coerce_count(value).map(Value::from),
        FieldKind::Flag => coerce::coerce_bool(value).map(Value::Bool),
        FieldKind::Json => Some(match value {
            Value::String(s) => serde_json::from_str::<Value>(s)
                .ok()
                .filter(|v| v.is_object())
                .unwrap_or_else(|| value.clone()),
            other => other.clone(),
        }),
        FieldKind::FileEntries => coerce::coerce_file_entries(value),
        FieldKind::Indentation => coerce::coerce_indentation(value),
        FieldKind::FollowUps => coerce::coerce_follow_ups(value),
    }
}

// ============================================================================
// Display Formatters
// ============================================================================

fn param<'a>(params: &'a DisplayParams, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("")
}

fn plain(name: &str, _: &DisplayParams) -> String {
    format!("[{name}]")
}

fn for_command(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "command"))
}

fn for_path(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "path"))
}

fn for_optional_path(name: &str, p: &DisplayParams) -> String {
    match p.get("path") {
        Some(path) => format!("[{name} for '{path}']"),
        None => format!("[{name}]"),
    }
}

fn for_file_path(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "file_path"))
}

fn for_server(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "server_name"))
}

fn for_question(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "question"))
}

fn for_query(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "query"))
}

fn for_artifact(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "artifact_id"))
}

fn for_intent(name: &str, p: &DisplayParams) -> String {
    format!("[{name} for '{}']", param(p, "intent_id"))
}

fn read_file(name: &str, p: &DisplayParams) -> String {
    if let Some(path) = p.get("path") {
        return format!("[{name} for '{path}']");
    }
    let paths: Vec<String> = p
        .get("files")
        .and_then(|files| serde_json::from_str::<Value>(files).ok())
        .and_then(|v| coerce::coerce_file_entries(&v))
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| entry.get("path").and_then(Value::as_str).map(str::to_string))
        .collect();
    match paths.as_slice() {
        [] => format!("[{name}]"),
        [single] => format!("[{name} for '{single}']"),
        many => format!("[{name} for {} files]", many.len()),
    }
}

fn search_files(name: &str, p: &DisplayParams) -> String {
    match p.get("file_pattern") {
        Some(pattern) => format!("[{name} for '{}' in '{pattern}']", param(p, "regex")),
        None => format!("[{name} for '{}']", param(p, "regex")),
    }
}

fn switch_mode(name: &str, p: &DisplayParams) -> String {
    match p.get("reason") {
        Some(reason) => format!("[{name} to '{}' because: {reason}]", param(p, "mode_slug")),
        None => format!("[{name} to '{}']", param(p, "mode_slug")),
    }
}

fn new_task(name: &str, p: &DisplayParams) -> String {
    let mode = p.get("mode").map(String::as_str).unwrap_or("code");
    let message = p.get("message").map(String::as_str).unwrap_or("(no message)");
    format!("[{name} in {mode} mode: '{message}']")
}

fn with_args(name: &str, p: &DisplayParams, key: &str) -> String {
    match p.get("args") {
        Some(args) => format!("[{name} for '{}' with args: {args}]", param(p, key)),
        None => format!("[{name} for '{}']", param(p, key)),
    }
}

fn run_slash_command(name: &str, p: &DisplayParams) -> String {
    with_args(name, p, "command")
}

fn skill(name: &str, p: &DisplayParams) -> String {
    with_args(name, p, "skill")
}

// ============================================================================
// Table
// ============================================================================

const EDIT_FIELDS: &[FieldSpec] = &[
    req("file_path"),
    req("old_string"),
    req("new_string"),
    opt("replace_all", FieldKind::Flag),
];

static DESCRIPTORS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: ToolName::ExecuteCommand,
        fields: &[non_empty("command"), opt("cwd", FieldKind::Text)],
        display: for_command,
    },
    ToolDescriptor {
        name: ToolName::ReadFile,
        // path 또는 files 중 하나가 필요하며 resolver가 검사
        fields: &[
            opt("path", FieldKind::Text),
            opt("mode", FieldKind::Text),
            opt("offset", FieldKind::Count),
            opt("limit", FieldKind::Count),
            opt("indentation", FieldKind::Indentation),
            opt("files", FieldKind::FileEntries),
        ],
        display: read_file,
    },
    ToolDescriptor {
        name: ToolName::ReadCommandOutput,
        fields: &[
            req("artifact_id"),
            opt("search", FieldKind::Text),
            opt("offset", FieldKind::Count),
            opt("limit", FieldKind::Count),
        ],
        display: for_artifact,
    },
    ToolDescriptor {
        name: ToolName::WriteToFile,
        fields: &[req("path"), req("content")],
        display: for_path,
    },
    ToolDescriptor {
        name: ToolName::ApplyDiff,
        fields: &[req("path"), req("diff")],
        display: for_optional_path,
    },
    ToolDescriptor {
        name: ToolName::Edit,
        fields: EDIT_FIELDS,
        display: for_file_path,
    },
    ToolDescriptor {
        name: ToolName::SearchAndReplace,
        fields: EDIT_FIELDS,
        display: for_file_path,
    },
    ToolDescriptor {
        name: ToolName::SearchReplace,
        fields: &[req("file_path"), req("old_string"), req("new_string")],
        display: for_file_path,
    },
    ToolDescriptor {
        name: ToolName::EditFile,
        fields: &[
            req("file_path"),
            req("old_string"),
            req("new_string"),
            opt("expected_replacements", FieldKind::Count),
        ],
        display: for_file_path,
    },
    ToolDescriptor {
        name: ToolName::ApplyPatch,
        fields: &[req("patch")],
        display: plain,
    },
    ToolDescriptor {
        name: ToolName::SearchFiles,
        fields: &[
            req("path"),
            req("regex"),
            opt("file_pattern", FieldKind::Text),
        ],
        display: search_files,
    },
    ToolDescriptor {
        name: ToolName::ListFiles,
        fields: &[req("path"), opt("recursive", FieldKind::Flag)],
        display: for_path,
    },
    ToolDescriptor {
        name: ToolName::UseMcpTool,
        fields: &[
            req("server_name"),
            req("tool_name"),
            opt("arguments", FieldKind::Json),
        ],
        display: for_server,
    },
    ToolDescriptor {
        name: ToolName::AccessMcpResource,
        fields: &[req("server_name"), req("uri")],
        display: for_server,
    },
    ToolDescriptor {
        name: ToolName::AskFollowupQuestion,
        fields: &[req("question"), req_as("follow_up", FieldKind::FollowUps)],
        display: for_question,
    },
    ToolDescriptor {
        name: ToolName::AttemptCompletion,
        fields: &[non_empty("result")],
        display: plain,
    },
    ToolDescriptor {
        name: ToolName::SwitchMode,
        fields: &[req("mode_slug"), req("reason")],
        display: switch_mode,
    },
    ToolDescriptor {
        name: ToolName::NewTask,
        fields: &[req("mode"), req("message"), opt("todos", FieldKind::Text)],
        display: new_task,
    },
    ToolDescriptor {
        name: ToolName::CodebaseSearch,
        fields: &[req("query"), opt("path", FieldKind::Text)],
        display: for_query,
    },
    ToolDescriptor {
        name: ToolName::UpdateTodoList,
        fields: &[req("todos")],
        display: plain,
    },
    ToolDescriptor {
        name: ToolName::RunSlashCommand,
        fields: &[non_empty("command"), opt("args", FieldKind::Text)],
        display: run_slash_command,
    },
    ToolDescriptor {
        name: ToolName::Skill,
        fields: &[req("skill"), opt("args", FieldKind::Text)],
        display: skill,
    },
    ToolDescriptor {
        name: ToolName::GenerateImage,
        fields: &[req("prompt"), req("path"), opt("image", FieldKind::Text)],
        display: for_path,
    },
    ToolDescriptor {
        name: ToolName::SelectActiveIntent,
        fields: &[req("intent_id")],
        display: for_intent,
    },
    ToolDescriptor {
        name: ToolName::RecordLessonLearned,
        fields: &[req("lesson")],
        display: plain,
    },
];

/// 도구 설명자 조회
pub fn descriptor(name: ToolName) -> Option<&'static ToolDescriptor> {
    DESCRIPTORS.iter().find(|d| d.name == name)
}

/// 카탈로그 도구의 호출 설명 (설명자가 없으면 `[name]`)
pub fn describe_call(name: &str, params: &DisplayParams) -> String {
    match ToolName::parse(name).and_then(descriptor) {
        Some(d) => d.describe(params),
        None => plain(name, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> DisplayParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_every_tool_has_descriptor() {
        for tool in ToolName::ALL {
            assert!(descriptor(tool).is_some(), "missing descriptor for {tool}");
        }
        assert_eq!(DESCRIPTORS.len(), ToolName::ALL.len());
    }

    #[test]
    fn test_normalize_coerces_and_drops() {
        let d = descriptor(ToolName::ListFiles).unwrap();
        let normalized = d.normalize(&object(json!({
            "path": "src",
            "recursive": "true",
            "color": "red",
        })));
        assert_eq!(Value::Object(normalized), json!({"path": "src", "recursive": true}));
    }

    #[test]
    fn test_missing_required() {
        let d = descriptor(ToolName::WriteToFile).unwrap();
        let normalized = d.normalize(&object(json!({"path": "a.txt", "content": null})));
        assert_eq!(d.missing_required(&normalized), vec!["content"]);

        let d = descriptor(ToolName::AttemptCompletion).unwrap();
        let normalized = d.normalize(&object(json!({"result": ""})));
        assert_eq!(d.missing_required(&normalized), vec!["result"]);
    }

    #[test]
    fn test_required_fields_listing() {
        let d = descriptor(ToolName::EditFile).unwrap();
        let required: Vec<_> = d.required_fields().collect();
        assert_eq!(required, vec!["file_path", "old_string", "new_string"]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe_call("execute_command", &params(&[("command", "ls")])),
            "[execute_command for 'ls']"
        );
        assert_eq!(
            describe_call("search_files", &params(&[("regex", "fn"), ("file_pattern", "*.rs")])),
            "[search_files for 'fn' in '*.rs']"
        );
        assert_eq!(describe_call("apply_diff", &params(&[])), "[apply_diff]");
        assert_eq!(
            describe_call("skill", &params(&[("skill", "review"), ("args", "--fast")])),
            "[skill for 'review' with args: --fast]"
        );
        assert_eq!(describe_call("custom_tool", &params(&[])), "[custom_tool]");
    }

    #[test]
    fn test_describe_read_file_files() {
        let files = r#"[{"path":"a.rs"},{"path":"b.rs"}]"#;
        assert_eq!(
            describe_call("read_file", &params(&[("files", files)])),
            "[read_file for 2 files]"
        );
        assert_eq!(
            describe_call("read_file", &params(&[("path", "a.rs")])),
            "[read_file for 'a.rs']"
        );
    }
}
