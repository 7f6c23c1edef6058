//! Assistant / user content blocks

use serde::{Deserialize, Serialize};
use warden_core::{McpToolUse, ResolvedToolCall, ToolUse};

// ============================================================================
// AssistantContent
// ============================================================================

/// 어시스턴트 메시지의 콘텐츠 블록
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantContent {
    Text { content: String, partial: bool },
    ToolUse(ToolUse),
    McpToolUse(McpToolUse),
}

impl AssistantContent {
    pub fn text(content: impl Into<String>, partial: bool) -> Self {
        AssistantContent::Text {
            content: content.into(),
            partial,
        }
    }

    pub fn is_partial(&self) -> bool {
        match self {
            AssistantContent::Text { partial, .. } => *partial,
            AssistantContent::ToolUse(t) => t.partial,
            AssistantContent::McpToolUse(m) => m.partial,
        }
    }

    /// 도구 호출 id (텍스트 블록은 None)
    pub fn call_id(&self) -> Option<&str> {
        match self {
            AssistantContent::Text { .. } => None,
            AssistantContent::ToolUse(t) => t.id.as_deref(),
            AssistantContent::McpToolUse(m) => m.id.as_deref(),
        }
    }

    pub fn is_tool(&self) -> bool {
        !matches!(self, AssistantContent::Text { .. })
    }
}

impl From<ResolvedToolCall> for AssistantContent {
    fn from(call: ResolvedToolCall) -> Self {
        match call {
            ResolvedToolCall::ToolUse(t) => AssistantContent::ToolUse(t),
            ResolvedToolCall::Dynamic(m) => AssistantContent::McpToolUse(m),
        }
    }
}

// ============================================================================
// ToolResponse
// ============================================================================

/// 도구 응답 조각
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePart {
    Text { text: String },
    Image { source: String },
}

/// 도구가 반환하는 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResponse {
    Text(String),
    Parts(Vec<ResponsePart>),
}

impl ToolResponse {
    /// 텍스트 부분 (줄바꿈으로 연결)
    pub fn text(&self) -> String {
        match self {
            ToolResponse::Text(text) => text.clone(),
            ToolResponse::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ResponsePart::Text { text } => Some(text.as_str()),
                    ResponsePart::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// 이미지 부분
    pub fn images(&self) -> Vec<String> {
        match self {
            ToolResponse::Text(_) => Vec::new(),
            ToolResponse::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ResponsePart::Image { source } => Some(source.clone()),
                    ResponsePart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

impl From<String> for ToolResponse {
    fn from(text: String) -> Self {
        ToolResponse::Text(text)
    }
}

impl From<&str> for ToolResponse {
    fn from(text: &str) -> Self {
        ToolResponse::Text(text.to_string())
    }
}

// ============================================================================
// UserContent
// ============================================================================

/// 다음 요청의 사용자 메시지에 들어갈 블록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserContent {
    Text {
        text: String,
    },
    Image {
        source: String,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl UserContent {
    pub fn text(text: impl Into<String>) -> Self {
        UserContent::Text { text: text.into() }
    }

    pub fn tool_result_id(&self) -> Option<&str> {
        match self {
            UserContent::ToolResult { tool_use_id, .. } => Some(tool_use_id),
            _ => None,
        }
    }
}

/// 도구 호출 id를 `[A-Za-z0-9_-]`로 정리
pub fn sanitize_tool_use_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
