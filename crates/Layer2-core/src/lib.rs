//! warden-core: Core runtime for Warden
//!
//! Layer2 - 도구 호출 디코딩, 해석, 정책 레이어
//!
//! # 주요 모듈
//!
//! - `stream`: 스트리밍 인자 디코딩 (부분 JSON, 호출별 누적)
//! - `tool`: 정적 카탈로그, 디스크립터 테이블, Tool Call Resolver
//! - `hook`: pre/post Hook 파이프라인과 내장 거버넌스 Hook
//! - `governance`: 거버넌스 협력자 인터페이스
//!
//! # 사용 예시
//!
//! ```ignore
//! use warden_core::{ToolCallResolver, ToolCallStreamState, ToolCatalog, CustomToolRegistry};
//!
//! let resolver = ToolCallResolver::new(
//!     Arc::new(ToolCatalog::new()),
//!     Arc::new(CustomToolRegistry::new()),
//! );
//! let mut state = ToolCallStreamState::new(resolver);
//!
//! state.begin_request();
//! for chunk in chunks {
//!     for update in state.process_chunk(chunk) {
//!         // StreamUpdate::Partial / Complete / Failed
//!     }
//! }
//! ```

pub mod governance;
pub mod hook;
pub mod stream;
pub mod tool;

// Re-exports: Governance
pub use governance::{Governance, GovernanceScope, InMemoryGovernance};

// Re-exports: Hook
pub use hook::{
    HookEngine, HookInvocationContext, HookVerdict, PostToolHook, PreToolHook, TaskInfo,
    DEFAULT_DENIAL_REASON,
};

// Re-exports: Stream
pub use stream::{parse_partial, ArgumentStreamDecoder, StreamUpdate, ToolCallStreamState};

// Re-exports: Tool
pub use tool::{
    describe_call, CustomTool, CustomToolContext, CustomToolRegistry, DisplayParams, McpToolName,
    McpToolUse, NativeArgs, RawToolCall, ResolvedToolCall, ToolArguments, ToolCallResolver,
    ToolCatalog, ToolIdent, ToolName, ToolUse,
};
