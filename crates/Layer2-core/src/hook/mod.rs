//! Hook 시스템 - 도구 호출 전후 정책 파이프라인
//!
//! - `types`: 컨텍스트, 판정, Hook 트레이트
//! - `pipeline`: `HookEngine` (pre: 거부 가능, post: 관찰만)
//! - `builtin`: 거버넌스 Hook 구현

pub mod builtin;
pub mod pipeline;
pub mod types;

pub use builtin::{
    ConcurrencyPostHook, ConcurrencyPreHook, IntentValidationHook, ScopeEnforcementHook,
    TraceLoggingHook, VerificationLessonHook,
};
pub use pipeline::HookEngine;
pub use types::{
    HookInvocationContext, HookVerdict, PostToolHook, PreToolHook, TaskInfo,
    DEFAULT_DENIAL_REASON,
};
