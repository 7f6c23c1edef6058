//! User interaction surface (approval prompts and messages)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_foundation::Result;

/// 사용자에게 묻는 질문 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskKind {
    /// 도구 실행 승인
    Tool,
    /// 명령 실행 승인
    Command,
    /// MCP 서버 사용 승인
    UseMcpServer,
    /// 후속 질문
    Followup,
    /// 반복/실수 한도 도달
    MistakeLimitReached,
}

/// 사용자에게 보여주는 메시지 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SayKind {
    Text,
    Error,
    UserFeedback,
}

/// 질문에 대한 응답 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskResponseKind {
    /// 승인 버튼
    Approved,
    /// 거부 버튼
    Denied,
    /// 자유 텍스트 응답
    Message,
}

/// 질문에 대한 사용자 응답
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub kind: AskResponseKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl AskResponse {
    pub fn approved() -> Self {
        Self {
            kind: AskResponseKind::Approved,
            text: None,
            images: Vec::new(),
        }
    }

    pub fn denied() -> Self {
        Self {
            kind: AskResponseKind::Denied,
            text: None,
            images: Vec::new(),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: AskResponseKind::Message,
            text: Some(text.into()),
            images: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn is_approved(&self) -> bool {
        self.kind == AskResponseKind::Approved
    }

    /// 비어 있지 않은 피드백 텍스트
    pub fn feedback(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// 사용자 상호작용 트레이트
#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// 질문하고 응답 대기
    async fn ask(&self, kind: AskKind, message: Option<&str>) -> Result<AskResponse>;

    /// 메시지 표시
    async fn say(&self, kind: SayKind, text: &str, images: &[String], partial: bool)
        -> Result<()>;
}

/// 모든 질문을 승인하고 메시지는 로그로만 남기는 구현
///
/// Used for unattended runs and replay diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl UserInteraction for AutoApprove {
    async fn ask(&self, kind: AskKind, message: Option<&str>) -> Result<AskResponse> {
        tracing::debug!(kind = ?kind, message = ?message, "Auto-approving");
        Ok(AskResponse::approved())
    }

    async fn say(
        &self,
        kind: SayKind,
        text: &str,
        _images: &[String],
        partial: bool,
    ) -> Result<()> {
        if !partial {
            match kind {
                SayKind::Error => tracing::warn!("{}", text),
                _ => tracing::info!(kind = ?kind, "{}", text),
            }
        }
        Ok(())
    }
}
