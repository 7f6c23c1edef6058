//! Hook Engine - pre/post Hook 실행 파이프라인
//!
//! Pre-hooks run in registration order and the first denial wins.
//! Post-hooks always all run. A hook that errors or panics is logged and
//! the next hook still runs.

use super::builtin::{
    ConcurrencyPostHook, ConcurrencyPreHook, IntentValidationHook, ScopeEnforcementHook,
    TraceLoggingHook, VerificationLessonHook,
};
use super::types::{HookInvocationContext, HookVerdict, PostToolHook, PreToolHook};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use warden_foundation::HookSettings;

/// Hook 실행 엔진
#[derive(Clone)]
pub struct HookEngine {
    pre_hooks: Vec<Arc<dyn PreToolHook>>,
    post_hooks: Vec<Arc<dyn PostToolHook>>,
    fail_closed: bool,
}

impl Default for HookEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HookEngine {
    /// 빈 엔진 (fail-closed)
    pub fn new() -> Self {
        Self {
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            fail_closed: true,
        }
    }

    /// 설정에 따라 내장 Hook 등록
    pub fn from_settings(settings: &HookSettings) -> Self {
        let mut engine = Self::new().with_fail_closed(settings.fail_closed);

        if settings.intent_validation {
            engine.register_pre(Arc::new(IntentValidationHook));
        }
        if settings.scope_enforcement {
            engine.register_pre(Arc::new(ScopeEnforcementHook));
        }
        if settings.concurrency_guard {
            engine.register_pre(Arc::new(ConcurrencyPreHook));
            engine.register_post(Arc::new(ConcurrencyPostHook));
        }
        if settings.trace_logging {
            engine.register_post(Arc::new(TraceLoggingHook));
        }
        if settings.verification_lessons {
            engine.register_post(Arc::new(VerificationLessonHook));
        }

        tracing::debug!(
            pre = engine.pre_hooks.len(),
            post = engine.post_hooks.len(),
            fail_closed = engine.fail_closed,
            "Hook engine configured"
        );
        engine
    }

    pub fn with_fail_closed(mut self, fail_closed: bool) -> Self {
        self.fail_closed = fail_closed;
        self
    }

    pub fn register_pre(&mut self, hook: Arc<dyn PreToolHook>) {
        self.pre_hooks.push(hook);
    }

    pub fn register_post(&mut self, hook: Arc<dyn PostToolHook>) {
        self.post_hooks.push(hook);
    }

    pub fn pre_hook_names(&self) -> Vec<&str> {
        self.pre_hooks.iter().map(|h| h.name()).collect()
    }

    pub fn post_hook_names(&self) -> Vec<&str> {
        self.post_hooks.iter().map(|h| h.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pre_hooks.is_empty() && self.post_hooks.is_empty()
    }

    /// Pre 단계 실행
    ///
    /// Returns the first denial. With fail-closed on, a failed hook turns
    /// an otherwise allowed phase into a denial naming that hook.
    pub async fn run_pre(&self, ctx: &HookInvocationContext) -> HookVerdict {
        let mut failed_hook: Option<String> = None;

        for hook in &self.pre_hooks {
            let outcome = AssertUnwindSafe(hook.check(ctx)).catch_unwind().await;
            match outcome {
                Ok(Ok(Some(verdict))) if !verdict.allow => {
                    let reason = verdict.denial_reason().to_string();
                    tracing::info!(
                        hook = hook.name(),
                        tool = %ctx.tool_name,
                        call_id = ?ctx.call_id,
                        reason = %reason,
                        "Tool call denied by hook"
                    );
                    return HookVerdict::deny(reason);
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(hook = hook.name(), tool = %ctx.tool_name, error = %e, "Pre-hook failed");
                    failed_hook.get_or_insert_with(|| hook.name().to_string());
                }
                Err(panic) => {
                    tracing::error!(
                        hook = hook.name(),
                        tool = %ctx.tool_name,
                        panic = %panic_message(panic.as_ref()),
                        "Pre-hook panicked"
                    );
                    failed_hook.get_or_insert_with(|| hook.name().to_string());
                }
            }
        }

        match failed_hook {
            Some(hook) if self.fail_closed => HookVerdict::deny(format!(
                "Hook '{}' failed while checking '{}'; the tool call was blocked",
                hook, ctx.tool_name
            )),
            _ => HookVerdict::allow(),
        }
    }

    /// Post 단계 실행 (모든 Hook 실행, 실패는 로그만)
    pub async fn run_post(&self, ctx: &HookInvocationContext) {
        for hook in &self.post_hooks {
            let outcome = AssertUnwindSafe(hook.observe(ctx)).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(hook = hook.name(), tool = %ctx.tool_name, error = %e, "Post-hook failed");
                }
                Err(panic) => {
                    tracing::error!(
                        hook = hook.name(),
                        tool = %ctx.tool_name,
                        panic = %panic_message(panic.as_ref()),
                        "Post-hook panicked"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for HookEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookEngine")
            .field("pre_hooks", &self.pre_hook_names())
            .field("post_hooks", &self.post_hook_names())
            .field("fail_closed", &self.fail_closed)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::InMemoryGovernance;
    use crate::hook::types::{TaskInfo, DEFAULT_DENIAL_REASON};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use warden_foundation::{Error, Result};

    type Log = Arc<Mutex<Vec<String>>>;

    enum Behavior {
        Allow,
        Silent,
        Deny(Option<&'static str>),
        Fail,
        Panic,
    }

    struct TestPre {
        name: &'static str,
        behavior: Behavior,
        log: Log,
    }

    #[async_trait]
    impl PreToolHook for TestPre {
        fn name(&self) -> &str {
            self.name
        }

        async fn check(&self, _ctx: &HookInvocationContext) -> Result<Option<HookVerdict>> {
            self.log.lock().push(self.name.to_string());
            match self.behavior {
                Behavior::Allow => Ok(Some(HookVerdict::allow())),
                Behavior::Silent => Ok(None),
                Behavior::Deny(reason) => Ok(Some(HookVerdict {
                    allow: false,
                    reason: reason.map(str::to_string),
                })),
                Behavior::Fail => Err(Error::hook(self.name, "broken")),
                Behavior::Panic => panic!("hook exploded"),
            }
        }
    }

    struct TestPost {
        name: &'static str,
        fail: bool,
        log: Log,
    }

    #[async_trait]
    impl PostToolHook for TestPost {
        fn name(&self) -> &str {
            self.name
        }

        async fn observe(&self, ctx: &HookInvocationContext) -> Result<()> {
            self.log
                .lock()
                .push(format!("{}:{}", self.name, ctx.error.is_some()));
            if self.fail {
                panic!("post hook exploded");
            }
            Ok(())
        }
    }

    fn pre(name: &'static str, behavior: Behavior, log: &Log) -> Arc<dyn PreToolHook> {
        Arc::new(TestPre {
            name,
            behavior,
            log: log.clone(),
        })
    }

    fn ctx() -> HookInvocationContext {
        HookInvocationContext::new(
            TaskInfo::new("task", "."),
            Arc::new(InMemoryGovernance::new()),
            "write_to_file",
            json!({"path": "a.txt", "content": "x"}),
        )
    }

    // ========================================================================
    // Pre phase
    // ========================================================================

    #[tokio::test]
    async fn test_first_denial_short_circuits() {
        let log = Log::default();
        let mut engine = HookEngine::new();
        engine.register_pre(pre("a", Behavior::Allow, &log));
        engine.register_pre(pre("b", Behavior::Deny(Some("outside owned scope")), &log));
        engine.register_pre(pre("c", Behavior::Deny(Some("never")), &log));

        let verdict = engine.run_pre(&ctx()).await;
        assert!(!verdict.allow);
        assert_eq!(verdict.denial_reason(), "outside owned scope");
        assert_eq!(*log.lock(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_denial_without_reason_uses_default() {
        let log = Log::default();
        let mut engine = HookEngine::new();
        engine.register_pre(pre("a", Behavior::Deny(None), &log));

        let verdict = engine.run_pre(&ctx()).await;
        assert_eq!(verdict.reason.as_deref(), Some(DEFAULT_DENIAL_REASON));
    }

    #[tokio::test]
    async fn test_silent_hooks_allow() {
        let log = Log::default();
        let mut engine = HookEngine::new();
        engine.register_pre(pre("a", Behavior::Silent, &log));
        engine.register_pre(pre("b", Behavior::Allow, &log));
        assert!(engine.run_pre(&ctx()).await.allow);
        assert!(HookEngine::new().run_pre(&ctx()).await.allow);
    }

    #[tokio::test]
    async fn test_failing_hook_is_isolated_and_fails_closed() {
        let log = Log::default();
        let mut engine = HookEngine::new();
        engine.register_pre(pre("broken", Behavior::Fail, &log));
        engine.register_pre(pre("panicky", Behavior::Panic, &log));
        engine.register_pre(pre("after", Behavior::Allow, &log));

        let verdict = engine.run_pre(&ctx()).await;
        assert_eq!(*log.lock(), vec!["broken", "panicky", "after"]);
        assert!(!verdict.allow);
        assert!(verdict.denial_reason().contains("broken"));
    }

    #[tokio::test]
    async fn test_fail_open_allows_after_failure() {
        let log = Log::default();
        let mut engine = HookEngine::new().with_fail_closed(false);
        engine.register_pre(pre("broken", Behavior::Fail, &log));
        assert!(engine.run_pre(&ctx()).await.allow);
    }

    #[tokio::test]
    async fn test_denial_beats_earlier_failure() {
        let log = Log::default();
        let mut engine = HookEngine::new();
        engine.register_pre(pre("broken", Behavior::Fail, &log));
        engine.register_pre(pre("guard", Behavior::Deny(Some("stale")), &log));
        assert_eq!(engine.run_pre(&ctx()).await.denial_reason(), "stale");
    }

    // ========================================================================
    // Post phase
    // ========================================================================

    #[tokio::test]
    async fn test_post_hooks_all_run() {
        let log = Log::default();
        let mut engine = HookEngine::new();
        engine.register_post(Arc::new(TestPost {
            name: "first",
            fail: true,
            log: log.clone(),
        }));
        engine.register_post(Arc::new(TestPost {
            name: "second",
            fail: false,
            log: log.clone(),
        }));

        let mut ctx = ctx();
        ctx.record_failure("handler failed");
        engine.run_post(&ctx).await;
        assert_eq!(*log.lock(), vec!["first:true", "second:true"]);
    }

    #[test]
    fn test_from_settings() {
        let settings = HookSettings::default();
        let engine = HookEngine::from_settings(&settings);
        assert_eq!(
            engine.pre_hook_names(),
            vec!["IntentValidationHook", "ScopeEnforcementHook", "ConcurrencyPreHook"]
        );
        assert_eq!(
            engine.post_hook_names(),
            vec!["ConcurrencyPostHook", "TraceLoggingHook"]
        );
    }
}
