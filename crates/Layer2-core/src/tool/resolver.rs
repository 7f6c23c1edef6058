//! Tool Call Resolver
//!
//! Turns `{id, name, argumentsText}` into a [`ResolvedToolCall`]:
//! composite names become dynamic calls, aliases are resolved, unknown
//! names are rejected, and catalog tools get typed arguments built from
//! the descriptor table.

use super::args::{FileEntry, NativeArgs, ReadFileArgs};
use super::call::{McpToolUse, ResolvedToolCall, ToolArguments, ToolIdent, ToolUse};
use super::catalog::ToolCatalog;
use super::custom::CustomToolRegistry;
use super::descriptor::{descriptor, DisplayParams};
use super::mcp_name::McpToolName;
use super::names::{is_known_param, ToolName};
use serde_json::{Map, Value};
use std::sync::Arc;
use warden_foundation::{Error, Result};

/// 원시 도구 호출 (스트림 종료 시점)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl RawToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// 도구 호출 해석기
#[derive(Debug, Clone)]
pub struct ToolCallResolver {
    catalog: Arc<ToolCatalog>,
    custom_tools: Arc<CustomToolRegistry>,
    custom_tools_enabled: bool,
}

impl ToolCallResolver {
    pub fn new(catalog: Arc<ToolCatalog>, custom_tools: Arc<CustomToolRegistry>) -> Self {
        Self {
            catalog,
            custom_tools,
            custom_tools_enabled: true,
        }
    }

    pub fn with_custom_tools_enabled(mut self, enabled: bool) -> Self {
        self.custom_tools_enabled = enabled;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn custom_tools(&self) -> &Arc<CustomToolRegistry> {
        &self.custom_tools
    }

    // ========================================================================
    // Complete calls
    // ========================================================================

    /// 완료된 호출 해석 (실패 시 로그 후 None)
    pub fn resolve(&self, call: &RawToolCall) -> Option<ResolvedToolCall> {
        match self.try_resolve(call) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                tracing::error!(
                    id = %call.id,
                    tool = %call.name,
                    error = %e,
                    "Failed to resolve tool call"
                );
                None
            }
        }
    }

    /// 완료된 호출 해석 (실패 사유 반환)
    pub fn try_resolve(&self, call: &RawToolCall) -> Result<ResolvedToolCall> {
        let id = non_empty_id(&call.id);

        if let Some(mcp) = McpToolName::parse(&call.name) {
            let arguments = Value::Object(parse_arguments(&call.name, &call.arguments)?);
            tracing::debug!(server = %mcp.server_name, tool = %mcp.tool_name, "Resolved dynamic tool call");
            return Ok(ResolvedToolCall::Dynamic(McpToolUse::new(id, mcp, arguments)));
        }

        let ident = self
            .identify(&call.name)
            .ok_or_else(|| Error::ToolNotFound(call.name.clone()))?;
        let raw = parse_arguments(&call.name, &call.arguments)?;
        let params = display_params(&ident, &raw, false);
        let (arguments, used_legacy_format) = build_complete(&ident, &raw)?;

        Ok(ResolvedToolCall::ToolUse(ToolUse {
            id,
            original_name: original_name(&call.name, &ident),
            name: ident,
            params,
            arguments: Some(arguments),
            partial: false,
            used_legacy_format,
        }))
    }

    // ========================================================================
    // Partial calls
    // ========================================================================

    /// 스트리밍 중 부분 호출 생성 (표시 전용)
    ///
    /// Dynamic calls and non-object values yield nothing. Unknown names
    /// still produce a display block; they can never execute.
    pub fn resolve_partial(&self, id: &str, name: &str, partial: &Value) -> Option<ResolvedToolCall> {
        if McpToolName::parse(name).is_some() {
            return None;
        }
        let raw = partial.as_object()?;

        let ident = self
            .identify(name)
            .unwrap_or_else(|| ToolIdent::Unknown(name.to_string()));
        let params = display_params(&ident, raw, true);

        let (arguments, used_legacy_format) = match &ident {
            ToolIdent::Catalog(tool) => match descriptor(*tool) {
                Some(d) => {
                    let normalized = d.normalize(raw);
                    let legacy = has_legacy_files(&normalized);
                    let args = (!normalized.is_empty()).then(|| ToolArguments::Partial(normalized));
                    (args, legacy)
                }
                None => (None, false),
            },
            ToolIdent::Custom(_) => (Some(ToolArguments::Custom(Value::Object(raw.clone()))), false),
            ToolIdent::Unknown(_) => (None, false),
        };

        Some(ResolvedToolCall::ToolUse(ToolUse {
            id: non_empty_id(id),
            original_name: original_name(name, &ident),
            name: ident,
            params,
            arguments,
            partial: true,
            used_legacy_format,
        }))
    }

    /// 이름을 카탈로그/커스텀 도구로 식별
    pub fn identify(&self, name: &str) -> Option<ToolIdent> {
        if let Some(tool) = self.catalog.lookup(name) {
            return Some(ToolIdent::Catalog(tool));
        }
        if self.custom_tools_enabled {
            let canonical = self.catalog.resolve_alias(name);
            for candidate in [name, canonical] {
                if self.custom_tools.has(candidate) {
                    return Some(ToolIdent::Custom(candidate.to_string()));
                }
            }
        }
        None
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn non_empty_id(id: &str) -> Option<String> {
    (!id.trim().is_empty()).then(|| id.to_string())
}

fn original_name(received: &str, ident: &ToolIdent) -> Option<String> {
    (received != ident.as_str()).then(|| received.to_string())
}

/// 인자 텍스트 파싱 (빈 문자열은 빈 객체)
fn parse_arguments(tool: &str, text: &str) -> Result<Map<String, Value>> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::invalid_arguments(
            tool,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(e) => Err(Error::Decode(format!(
            "Invalid JSON arguments for '{}': {}",
            tool, e
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// 표시용 파라미터 (어휘에 없는 키는 커스텀 도구가 아니면 제외)
fn display_params(ident: &ToolIdent, raw: &Map<String, Value>, partial: bool) -> DisplayParams {
    let accept_any = matches!(ident, ToolIdent::Custom(_));
    let mut params = DisplayParams::new();
    for (key, value) in raw {
        if !accept_any && !is_known_param(key) {
            if partial {
                tracing::trace!(tool = %ident, param = %key, "Skipping unrecognized parameter");
            } else {
                tracing::warn!(tool = %ident, param = %key, "Dropping unrecognized parameter");
            }
            continue;
        }
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.insert(key.clone(), text);
    }
    params
}

fn has_legacy_files(normalized: &Map<String, Value>) -> bool {
    normalized
        .get("files")
        .and_then(Value::as_array)
        .map_or(false, |files| !files.is_empty())
}

/// 완료된 호출의 인자 생성 (필수 필드 강제)
fn build_complete(ident: &ToolIdent, raw: &Map<String, Value>) -> Result<(ToolArguments, bool)> {
    let tool = match ident {
        ToolIdent::Catalog(tool) => *tool,
        ToolIdent::Custom(_) => return Ok((ToolArguments::Custom(Value::Object(raw.clone())), false)),
        ToolIdent::Unknown(name) => return Err(Error::ToolNotFound(name.clone())),
    };
    let d = descriptor(tool).ok_or_else(|| Error::ToolNotFound(tool.to_string()))?;
    let normalized = d.normalize(raw);

    if tool == ToolName::ReadFile {
        return build_read_file(normalized);
    }

    let missing = d.missing_required(&normalized);
    if !missing.is_empty() {
        return Err(Error::invalid_arguments(
            tool.as_str(),
            format!("missing required parameter(s): {}", missing.join(", ")),
        ));
    }

    let args = NativeArgs::from_fields(tool, normalized)
        .map_err(|e| Error::invalid_arguments(tool.as_str(), e.to_string()))?;
    Ok((ToolArguments::Native(args), false))
}

/// `read_file`: 비어있지 않은 레거시 `files`가 `path`보다 우선
fn build_read_file(mut normalized: Map<String, Value>) -> Result<(ToolArguments, bool)> {
    if has_legacy_files(&normalized) {
        let files = normalized.remove("files").unwrap_or(Value::Null);
        let files: Vec<FileEntry> = serde_json::from_value(files)
            .map_err(|e| Error::invalid_arguments("read_file", e.to_string()))?;
        let args = NativeArgs::ReadFile(ReadFileArgs::Files { files });
        return Ok((ToolArguments::Native(args), true));
    }

    if !normalized.contains_key("path") {
        return Err(Error::invalid_arguments(
            "read_file",
            "missing required parameter(s): path (or a non-empty 'files' list)",
        ));
    }
    normalized.remove("files");
    let args = NativeArgs::from_fields(ToolName::ReadFile, normalized)
        .map_err(|e| Error::invalid_arguments("read_file", e.to_string()))?;
    Ok((ToolArguments::Native(args), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::args::{LineRange, ReadFilePathArgs, WriteToFileArgs};
    use crate::tool::custom::{CustomTool, CustomToolContext};
    use async_trait::async_trait;
    use serde_json::json;

    struct LintTool;

    #[async_trait]
    impl CustomTool for LintTool {
        fn name(&self) -> &str {
            "run_lint"
        }

        async fn execute(&self, _args: Value, _ctx: &CustomToolContext) -> Result<String> {
            Ok("clean".into())
        }
    }

    fn resolver() -> ToolCallResolver {
        let custom = Arc::new(CustomToolRegistry::new());
        custom.register(Arc::new(LintTool));
        ToolCallResolver::new(Arc::new(ToolCatalog::new()), custom)
    }

    fn tool_use(call: ResolvedToolCall) -> ToolUse {
        match call {
            ResolvedToolCall::ToolUse(t) => t,
            other => panic!("expected tool use, got {other:?}"),
        }
    }

    // ========================================================================
    // Complete resolution
    // ========================================================================

    #[test]
    fn test_alias_resolution_to_write_to_file() {
        let call = RawToolCall::new("c2", "write_file", r#"{"path":"a.txt","content":"x"}"#);
        let resolved = tool_use(resolver().resolve(&call).unwrap());

        assert_eq!(resolved.name, ToolIdent::Catalog(ToolName::WriteToFile));
        assert_eq!(resolved.original_name.as_deref(), Some("write_file"));
        assert_eq!(
            resolved.native_args(),
            Some(&NativeArgs::WriteToFile(WriteToFileArgs {
                path: "a.txt".into(),
                content: "x".into()
            }))
        );
        assert!(!resolved.partial);
    }

    #[test]
    fn test_truncated_arguments_fail() {
        let call = RawToolCall::new("c3", "execute_command", r#"{"command":"#);
        assert!(resolver().resolve(&call).is_none());
        assert!(matches!(resolver().try_resolve(&call), Err(Error::Decode(_))));
    }

    #[test]
    fn test_unknown_tool_fails() {
        let call = RawToolCall::new("c4", "teleport", "{}");
        assert!(matches!(
            resolver().try_resolve(&call),
            Err(Error::ToolNotFound(name)) if name == "teleport"
        ));
    }

    #[test]
    fn test_non_object_payload_fails() {
        let call = RawToolCall::new("c5", "execute_command", "[1,2]");
        assert!(matches!(
            resolver().try_resolve(&call),
            Err(Error::InvalidToolArguments { .. })
        ));
    }

    #[test]
    fn test_every_required_field_is_enforced() {
        let cases = [
            ("execute_command", json!({"command": "ls", "cwd": "/tmp"})),
            ("write_to_file", json!({"path": "a", "content": ""})),
            ("apply_diff", json!({"path": "a", "diff": "d"})),
            ("edit", json!({"file_path": "f", "old_string": "a", "new_string": "b"})),
            ("edit_file", json!({"file_path": "f", "old_string": "a", "new_string": "b"})),
            ("search_files", json!({"path": ".", "regex": "fn"})),
            ("list_files", json!({"path": "."})),
            ("use_mcp_tool", json!({"server_name": "s", "tool_name": "t"})),
            ("access_mcp_resource", json!({"server_name": "s", "uri": "u"})),
            ("ask_followup_question", json!({"question": "q", "follow_up": [{"text": "a"}]})),
            ("switch_mode", json!({"mode_slug": "ask", "reason": "r"})),
            ("new_task", json!({"mode": "code", "message": "m"})),
            ("generate_image", json!({"prompt": "p", "path": "i.png"})),
            ("select_active_intent", json!({"intent_id": "INT-1"})),
            ("record_lesson_learned", json!({"lesson": "l"})),
        ];

        let resolver = resolver();
        for (name, args) in cases {
            let call = RawToolCall::new("id", name, args.to_string());
            let resolved = resolver
                .try_resolve(&call)
                .unwrap_or_else(|e| panic!("{name} should resolve: {e}"));
            assert!(tool_use(resolved).native_args().is_some());

            let d = descriptor(ToolName::parse(name).unwrap()).unwrap();
            for field in d.required_fields() {
                let mut reduced = args.as_object().unwrap().clone();
                reduced.remove(field);
                let call = RawToolCall::new("id", name, Value::Object(reduced).to_string());
                assert!(
                    resolver.try_resolve(&call).is_err(),
                    "{name} without {field} should fail"
                );
            }
        }
    }

    #[test]
    fn test_empty_arguments_text_is_empty_object() {
        let call = RawToolCall::new("c6", "attempt_completion", "");
        assert!(matches!(
            resolver().try_resolve(&call),
            Err(Error::InvalidToolArguments { .. })
        ));
    }

    #[test]
    fn test_coercions_applied() {
        let call = RawToolCall::new(
            "c7",
            "list_files",
            r#"{"path":"src","recursive":"true"}"#,
        );
        let resolved = tool_use(resolver().resolve(&call).unwrap());
        assert_eq!(resolved.native_args().unwrap().to_value(), json!({"path": "src", "recursive": true}));
        assert_eq!(resolved.params.get("recursive").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_unrecognized_params_dropped_from_display() {
        let call = RawToolCall::new("c8", "execute_command", r#"{"command":"ls","color":"red","timeout":5}"#);
        let resolved = tool_use(resolver().resolve(&call).unwrap());
        assert_eq!(resolved.params.len(), 1);
        assert_eq!(resolved.params["command"], "ls");
    }

    // ========================================================================
    // read_file
    // ========================================================================

    #[test]
    fn test_read_file_path_form() {
        let call = RawToolCall::new(
            "r1",
            "read_file",
            r#"{"path":"src/lib.rs","mode":"slice","offset":"10","limit":50}"#,
        );
        let resolved = tool_use(resolver().resolve(&call).unwrap());
        assert!(!resolved.used_legacy_format);
        assert_eq!(
            resolved.native_args(),
            Some(&NativeArgs::ReadFile(ReadFileArgs::Path(ReadFilePathArgs {
                path: "src/lib.rs".into(),
                mode: Some("slice".into()),
                offset: Some(10),
                limit: Some(50),
                indentation: None,
            })))
        );
    }

    #[test]
    fn test_read_file_legacy_wins() {
        let files = r#"[{"path":"a.rs","line_ranges":["1-5"]}]"#;
        let args = json!({"path": "b.rs", "files": files});
        let call = RawToolCall::new("r2", "read_file", args.to_string());
        let resolved = tool_use(resolver().resolve(&call).unwrap());

        assert!(resolved.used_legacy_format);
        assert_eq!(
            resolved.native_args(),
            Some(&NativeArgs::ReadFile(ReadFileArgs::Files {
                files: vec![FileEntry {
                    path: "a.rs".into(),
                    line_ranges: vec![LineRange { start: 1, end: 5 }],
                }]
            }))
        );
    }

    #[test]
    fn test_read_file_empty_legacy_falls_back_to_path() {
        let call = RawToolCall::new("r3", "read_file", r#"{"path":"b.rs","files":[]}"#);
        let resolved = tool_use(resolver().resolve(&call).unwrap());
        assert!(!resolved.used_legacy_format);
        assert!(matches!(
            resolved.native_args(),
            Some(NativeArgs::ReadFile(ReadFileArgs::Path(_)))
        ));

        let call = RawToolCall::new("r4", "read_file", r#"{"files":[]}"#);
        assert!(resolver().resolve(&call).is_none());
    }

    // ========================================================================
    // Dynamic and custom tools
    // ========================================================================

    #[test]
    fn test_mcp_call_keeps_raw_arguments() {
        let call = RawToolCall::new("m1", "mcp__github__create_issue", r#"{"title":"bug","labels":["x"]}"#);
        match resolver().resolve(&call).unwrap() {
            ResolvedToolCall::Dynamic(mcp) => {
                assert_eq!(mcp.server_name, "github");
                assert_eq!(mcp.tool_name, "create_issue");
                assert_eq!(mcp.name, "mcp--github--create_issue");
                assert_eq!(mcp.arguments, json!({"title": "bug", "labels": ["x"]}));
            }
            other => panic!("expected dynamic call, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_tool_accepts_any_params() {
        let call = RawToolCall::new("x1", "run_lint", r#"{"fix":true,"paths":["src"]}"#);
        let resolved = tool_use(resolver().resolve(&call).unwrap());
        assert_eq!(resolved.name, ToolIdent::Custom("run_lint".into()));
        assert_eq!(resolved.params["fix"], "true");
        assert_eq!(resolved.params["paths"], "[\"src\"]");
        assert_eq!(
            resolved.arguments,
            Some(ToolArguments::Custom(json!({"fix": true, "paths": ["src"]})))
        );
    }

    #[test]
    fn test_custom_tools_can_be_disabled() {
        let resolver = resolver().with_custom_tools_enabled(false);
        let call = RawToolCall::new("x2", "run_lint", "{}");
        assert!(resolver.resolve(&call).is_none());
    }

    // ========================================================================
    // Partial resolution
    // ========================================================================

    #[test]
    fn test_partial_without_required_fields() {
        let partial = json!({"path": "a.t"});
        let resolved = tool_use(
            resolver()
                .resolve_partial("p1", "write_to_file", &partial)
                .unwrap(),
        );
        assert!(resolved.partial);
        assert_eq!(resolved.params["path"], "a.t");
        assert!(resolved.native_args().is_none());
        assert!(matches!(resolved.arguments, Some(ToolArguments::Partial(_))));
    }

    #[test]
    fn test_partial_unknown_and_mcp() {
        let r = resolver();
        let unknown = tool_use(r.resolve_partial("p2", "teleport", &json!({})).unwrap());
        assert_eq!(unknown.name, ToolIdent::Unknown("teleport".into()));
        assert!(unknown.arguments.is_none());

        assert!(r.resolve_partial("p3", "mcp--a--b", &json!({})).is_none());
        assert!(r.resolve_partial("p4", "read_file", &json!("text")).is_none());
    }
}
