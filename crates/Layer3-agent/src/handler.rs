//! Tool handler seams
//!
//! Handlers perform the actual side effects of catalog tools. The
//! presenter owns dispatch; a handler only sees a complete, validated
//! call and its callbacks.

use crate::callbacks::ToolCallbacks;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use warden_core::{ToolName, ToolUse};
use warden_foundation::Result;

/// 카탈로그 도구 핸들러
///
/// A handler reports its outcome through `callbacks`. Returning `Err`
/// propagates out of the presenter after post-hooks have run.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, call: &ToolUse, callbacks: &ToolCallbacks) -> Result<()>;
}

/// 워크스페이스 체크포인트 저장
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn save(&self) -> Result<()>;
}

/// 도구 이름 -> 핸들러 테이블
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ToolName, Arc<dyn ToolHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 핸들러 등록 (같은 도구면 교체)
    pub fn register(&mut self, tool: ToolName, handler: Arc<dyn ToolHandler>) {
        if self.handlers.insert(tool, handler).is_some() {
            tracing::debug!(tool = %tool, "Replaced tool handler");
        }
    }

    pub fn with(mut self, tool: ToolName, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(tool, handler);
        self
    }

    pub fn get(&self, tool: ToolName) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(&tool).cloned()
    }

    pub fn has(&self, tool: ToolName) -> bool {
        self.handlers.contains_key(&tool)
    }

    /// 등록된 도구 이름 (정렬)
    pub fn names(&self) -> Vec<ToolName> {
        let mut names: Vec<ToolName> = self.handlers.keys().copied().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn handle(&self, _call: &ToolUse, callbacks: &ToolCallbacks) -> Result<()> {
            callbacks.push_tool_result("ok");
            Ok(())
        }
    }

    #[test]
    fn test_registry() {
        let registry = HandlerRegistry::new()
            .with(ToolName::WriteToFile, Arc::new(Noop))
            .with(ToolName::ReadFile, Arc::new(Noop));

        assert_eq!(registry.len(), 2);
        assert!(registry.has(ToolName::ReadFile));
        assert!(registry.get(ToolName::ExecuteCommand).is_none());
        assert_eq!(
            registry.names(),
            vec![ToolName::ReadFile, ToolName::WriteToFile]
        );
    }
}
