//! Resolved tool call types

use super::args::NativeArgs;
use super::descriptor::{describe_call, DisplayParams};
use super::mcp_name::McpToolName;
use super::names::ToolName;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// 호출 대상 도구 식별
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolIdent {
    /// 정적 카탈로그 도구
    Catalog(ToolName),
    /// 동적으로 등록된 커스텀 도구
    Custom(String),
    /// 알 수 없는 도구 (스트리밍 중 부분 블록에서만 생성)
    Unknown(String),
}

impl ToolIdent {
    pub fn as_str(&self) -> &str {
        match self {
            ToolIdent::Catalog(tool) => tool.as_str(),
            ToolIdent::Custom(name) | ToolIdent::Unknown(name) => name,
        }
    }

    pub fn catalog(&self) -> Option<ToolName> {
        match self {
            ToolIdent::Catalog(tool) => Some(*tool),
            _ => None,
        }
    }
}

impl fmt::Display for ToolIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ToolIdent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 도구 인자
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolArguments {
    /// 실행 가능한 카탈로그 도구 인자
    Native(NativeArgs),
    /// 스트리밍 중 표시 전용 인자
    Partial(Map<String, Value>),
    /// 커스텀 도구 인자 (검증 없이 그대로)
    Custom(Value),
}

impl ToolArguments {
    /// JSON 값으로 변환
    pub fn to_value(&self) -> Value {
        match self {
            ToolArguments::Native(args) => args.to_value(),
            ToolArguments::Partial(map) => Value::Object(map.clone()),
            ToolArguments::Custom(value) => value.clone(),
        }
    }
}

/// 카탈로그 또는 커스텀 도구 호출
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUse {
    pub id: Option<String>,
    pub name: ToolIdent,
    /// 별칭으로 호출된 경우 원래 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub params: DisplayParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<ToolArguments>,
    pub partial: bool,
    pub used_legacy_format: bool,
}

impl ToolUse {
    /// 실행 가능한 카탈로그 인자
    pub fn native_args(&self) -> Option<&NativeArgs> {
        match &self.arguments {
            Some(ToolArguments::Native(args)) => Some(args),
            _ => None,
        }
    }

    /// 호출 설명 (예: `[write_to_file for 'a.txt']`)
    pub fn describe(&self) -> String {
        describe_call(self.name.as_str(), &self.params)
    }

    /// Hook 등에 전달할 인자 값
    pub fn arguments_value(&self) -> Value {
        match &self.arguments {
            Some(args) => args.to_value(),
            None => Value::Object(
                self.params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

/// 복합 이름으로 호출된 동적 기능 (MCP)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McpToolUse {
    pub id: Option<String>,
    /// 정규화된 복합 이름
    pub name: String,
    pub server_name: String,
    pub tool_name: String,
    pub arguments: Value,
    pub partial: bool,
}

impl McpToolUse {
    pub fn new(id: Option<String>, name: McpToolName, arguments: Value) -> Self {
        Self {
            id,
            name: name.composite(),
            server_name: name.server_name,
            tool_name: name.tool_name,
            arguments,
            partial: false,
        }
    }

    /// 호출 설명
    pub fn describe(&self) -> String {
        format!("[mcp_tool: {}/{}]", self.server_name, self.tool_name)
    }
}

/// 해석된 도구 호출
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedToolCall {
    ToolUse(ToolUse),
    #[serde(rename = "mcp_tool_use")]
    Dynamic(McpToolUse),
}

impl ResolvedToolCall {
    pub fn id(&self) -> Option<&str> {
        match self {
            ResolvedToolCall::ToolUse(t) => t.id.as_deref(),
            ResolvedToolCall::Dynamic(m) => m.id.as_deref(),
        }
    }

    pub fn is_partial(&self) -> bool {
        match self {
            ResolvedToolCall::ToolUse(t) => t.partial,
            ResolvedToolCall::Dynamic(m) => m.partial,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        match self {
            ResolvedToolCall::ToolUse(t) => Some(t),
            ResolvedToolCall::Dynamic(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::args::WriteToFileArgs;
    use serde_json::json;

    #[test]
    fn test_tool_use_describe_and_value() {
        let mut params = DisplayParams::new();
        params.insert("path".into(), "a.txt".into());
        let call = ToolUse {
            id: Some("c1".into()),
            name: ToolIdent::Catalog(ToolName::WriteToFile),
            original_name: None,
            params,
            arguments: Some(ToolArguments::Native(NativeArgs::WriteToFile(WriteToFileArgs {
                path: "a.txt".into(),
                content: "x".into(),
            }))),
            partial: false,
            used_legacy_format: false,
        };
        assert_eq!(call.describe(), "[write_to_file for 'a.txt']");
        assert_eq!(call.arguments_value(), json!({"path": "a.txt", "content": "x"}));
        assert!(call.native_args().is_some());
    }

    #[test]
    fn test_serialized_shape() {
        let call = ResolvedToolCall::Dynamic(McpToolUse::new(
            Some("c9".into()),
            McpToolName::new("github", "list"),
            json!({}),
        ));
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value["type"], "mcp_tool_use");
        assert_eq!(value["name"], "mcp--github--list");
        assert_eq!(call.id(), Some("c9"));
    }
}
