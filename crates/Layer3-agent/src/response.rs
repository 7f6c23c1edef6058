//! 도구 결과 메시지 포맷

use regex::Regex;
use std::sync::OnceLock;

/// 도구가 아무것도 반환하지 않았을 때의 결과
pub const NO_OUTPUT: &str = "(tool did not return anything)";

/// id 없는 도구 호출에 대한 에러
pub const MISSING_TOOL_USE_ID: &str = "Invalid tool call: missing tool_use.id. Text-embedded tool markup is not supported; use native tool calling instead.";

pub fn tool_error(message: &str) -> String {
    format!(
        "The tool execution failed with the following error:\n<error>\n{}\n</error>",
        message
    )
}

pub fn tool_denied() -> String {
    "The user denied this operation.".to_string()
}

pub fn tool_denied_with_feedback(feedback: &str) -> String {
    format!(
        "The user denied this operation and provided the following feedback:\n<feedback>\n{}\n</feedback>",
        feedback
    )
}

pub fn tool_approved_with_feedback(feedback: &str) -> String {
    format!(
        "The user approved this operation and provided the following context:\n<feedback>\n{}\n</feedback>",
        feedback
    )
}

/// 이전 거부 이후의 도구 블록
pub fn rejected_after_previous(description: &str, partial: bool) -> String {
    if partial {
        format!(
            "Tool {} was interrupted and not executed due to user rejecting a previous tool.",
            description
        )
    } else {
        format!(
            "Skipping tool {} due to user rejecting a previous tool.",
            description
        )
    }
}

/// 이전 거부 이후의 MCP 블록
pub fn mcp_rejected_after_previous(name: &str, partial: bool) -> String {
    if partial {
        format!(
            "MCP tool {} was interrupted and not executed due to user rejecting a previous tool.",
            name
        )
    } else {
        format!(
            "Skipping MCP tool {} due to user rejecting a previous tool.",
            name
        )
    }
}

pub fn missing_arguments(tool: &str) -> String {
    format!(
        "Invalid tool call for '{}': missing typed arguments. The model streamed invalid or incomplete arguments and the call could not be finalized.",
        tool
    )
}

pub fn unknown_tool(tool: &str) -> String {
    format!(
        "Unknown tool \"{}\". This tool does not exist. Please use one of the available tools.",
        tool
    )
}

pub fn repetition_limit(tool: &str) -> String {
    format!(
        "Tool call repetition limit reached for {}. Please try a different approach.",
        tool
    )
}

pub fn repetition_feedback(feedback: &str) -> String {
    format!("Tool repetition limit reached. User feedback: {}", feedback)
}

/// `handle_error` 결과 메시지
pub fn error_while(action: &str, error: &str) -> String {
    format!("Error {}: {}", action, error)
}

/// 텍스트에서 `<thinking>` 태그 제거
pub fn strip_thinking_tags(text: &str) -> String {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    match TAGS
        .get_or_init(|| Regex::new(r"<thinking>\s?|\s?</thinking>").ok())
        .as_ref()
    {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}
