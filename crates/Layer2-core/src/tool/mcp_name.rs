//! Composite (MCP) tool names
//!
//! Dynamic capabilities are addressed as `mcp--<server>--<tool>`. Some
//! models substitute `__` for the separator, which is normalized first.

use std::fmt;

/// 복합 이름 접두사
pub const MCP_TOOL_PREFIX: &str = "mcp";

/// 복합 이름 구분자
pub const MCP_TOOL_SEPARATOR: &str = "--";

const ALT_SEPARATOR: &str = "__";

/// 파싱된 복합 이름
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct McpToolName {
    pub server_name: String,
    pub tool_name: String,
}

impl McpToolName {
    pub fn new(server_name: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            tool_name: tool_name.into(),
        }
    }

    /// 복합 이름 파싱
    ///
    /// The tool part keeps any further separators, so `mcp--s--a--b`
    /// addresses tool `a--b` on server `s`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = normalize_mcp_name(name);
        let rest = normalized
            .strip_prefix(MCP_TOOL_PREFIX)?
            .strip_prefix(MCP_TOOL_SEPARATOR)?;
        let (server, tool) = rest.split_once(MCP_TOOL_SEPARATOR)?;
        if server.is_empty() || tool.is_empty() {
            return None;
        }
        Some(Self::new(server, tool))
    }

    /// 복합 이름 문자열
    pub fn composite(&self) -> String {
        format!(
            "{MCP_TOOL_PREFIX}{MCP_TOOL_SEPARATOR}{}{MCP_TOOL_SEPARATOR}{}",
            self.server_name, self.tool_name
        )
    }
}

impl fmt::Display for McpToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server_name, self.tool_name)
    }
}

/// `mcp__server__tool` 형태를 `mcp--server--tool`로 정규화
///
/// Only names that start with the prefix are rewritten.
pub fn normalize_mcp_name(name: &str) -> String {
    let alt_prefix = format!("{MCP_TOOL_PREFIX}{ALT_SEPARATOR}");
    if name.starts_with(&alt_prefix) {
        name.replace(ALT_SEPARATOR, MCP_TOOL_SEPARATOR)
    } else {
        name.to_string()
    }
}

/// 복합 이름 형태인지 확인 (정규화 후)
pub fn is_mcp_name(name: &str) -> bool {
    let prefix = format!("{MCP_TOOL_PREFIX}{MCP_TOOL_SEPARATOR}");
    normalize_mcp_name(name).starts_with(&prefix)
}
