use crate::hook::types::{HookInvocationContext, HookVerdict, PreToolHook};
use crate::tool::ToolName;
use async_trait::async_trait;
use warden_foundation::Result;

/// 파일 쓰기가 활성 intent의 소유 범위 안에 있는지 검사
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeEnforcementHook;

#[async_trait]
impl PreToolHook for ScopeEnforcementHook {
    fn name(&self) -> &str {
        "ScopeEnforcementHook"
    }

    async fn check(&self, ctx: &HookInvocationContext) -> Result<Option<HookVerdict>> {
        let Some(scope_id) = ctx.active_scope_id.as_deref() else {
            return Ok(None);
        };
        if !ToolName::parse(&ctx.tool_name).is_some_and(|t| t.is_file_mutation()) {
            return Ok(None);
        }
        let Some(scope) = ctx.governance.scope(scope_id) else {
            return Ok(None);
        };
        let Some(path) = ctx
            .target_paths()
            .into_iter()
            .find(|path| !ctx.governance.is_path_in_scope(&scope, path))
        else {
            return Ok(None);
        };

        tracing::debug!(path = %path, scope = %scope_id, "Write outside owned scope");
        Ok(Some(HookVerdict::deny(format!(
            "Scope violation: file '{}' is outside the owned scope of intent '{}'. Select an intent that covers this file or ask the user to adjust the scope.",
            path, scope_id
        ))))
    }
}
