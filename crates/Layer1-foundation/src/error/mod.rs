//! Error types for Warden
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Warden 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 스트림 디코딩 관련
    // ========================================================================
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unknown tool call id: {0}")]
    UnknownCall(String),

    // ========================================================================
    // Tool 관련
    // ========================================================================
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidToolArguments { tool: String, message: String },

    #[error("Tool execution failed: {tool} - {message}")]
    ToolExecution { tool: String, message: String },

    // ========================================================================
    // 정책 관련
    // ========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    #[error("Governance error: {0}")]
    Governance(String),

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Aborted: {0}")]
    Aborted(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 인자 에러 생성 헬퍼
    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidToolArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Tool 실행 에러 생성 헬퍼
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Hook 에러 생성 헬퍼
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}
