use crate::hook::types::{HookInvocationContext, HookVerdict, PreToolHook};
use crate::tool::ToolName;
use async_trait::async_trait;
use warden_foundation::Result;

/// 파괴적 도구 사용 전 활성 intent 선택을 요구
///
/// Only enforced when the governance collaborator defines at least one
/// scope. Read-only commands pass without an intent.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntentValidationHook;

#[async_trait]
impl PreToolHook for IntentValidationHook {
    fn name(&self) -> &str {
        "IntentValidationHook"
    }

    async fn check(&self, ctx: &HookInvocationContext) -> Result<Option<HookVerdict>> {
        let Some(tool) = ToolName::parse(&ctx.tool_name) else {
            return Ok(None);
        };
        if !tool.is_destructive() || ctx.active_scope_id.is_some() {
            return Ok(None);
        }
        if tool == ToolName::ExecuteCommand {
            let command = ctx.arg_str("command").unwrap_or_default();
            if !ctx.governance.is_destructive_command(command) {
                return Ok(None);
            }
        }
        if !ctx.governance.has_scopes() {
            return Ok(None);
        }

        Ok(Some(HookVerdict::deny(format!(
            "Access denied: this project is under architectural governance. Select an active intent with '{}' before using destructive tools like '{}'. Your next action must be a call to '{}'.",
            ToolName::SelectActiveIntent,
            tool,
            ToolName::SelectActiveIntent,
        ))))
    }
}
