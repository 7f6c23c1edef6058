use crate::hook::types::{HookInvocationContext, PostToolHook};
use crate::tool::ToolName;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use warden_foundation::Result;

/// 검증 명령으로 간주하는 키워드
const VERIFICATION_KEYWORDS: &[&str] = &["test", "lint", "check", "verify", "tsc", "build"];

/// 교훈이 기록되는 파일
pub const LESSONS_FILE: &str = "AGENTS.md";

/// 실패한 검증 명령을 `AGENTS.md`에 교훈으로 기록
#[derive(Debug, Default, Clone, Copy)]
pub struct VerificationLessonHook;

#[async_trait]
impl PostToolHook for VerificationLessonHook {
    fn name(&self) -> &str {
        "VerificationLessonHook"
    }

    async fn observe(&self, ctx: &HookInvocationContext) -> Result<()> {
        let Some(error) = ctx.error.as_deref() else {
            return Ok(());
        };
        if ctx.tool_name != ToolName::ExecuteCommand.as_str() {
            return Ok(());
        }
        let command = ctx.arg_str("command").unwrap_or_default();
        let lowered = command.to_lowercase();
        if !VERIFICATION_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            return Ok(());
        }

        let entry = format!(
            "\n\n### Lessons Learned ({})\n- Verification failed for command: '{}'. Error: {}\n",
            ctx.timestamp.to_rfc3339(),
            command,
            error
        );
        let path = ctx.task.cwd.join(LESSONS_FILE);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(command = %command, "Recorded verification lesson");
        Ok(())
    }
}
