//! # warden-agent
//!
//! Agent execution layer for Warden. Takes the resolved tool calls of one
//! assistant turn and presents them: policy checks, hooks, handler
//! dispatch, and exactly one tool result per call id.
//!
//! ## 핵심 컴포넌트
//!
//! - **Presenter**: 블록 단위 상태 머신 (single-flight + pending 플래그)
//! - **ToolCallbacks**: 승인 요청, 결과 기록(멱등), 에러 보고
//! - **ValidationPolicy**: 모드/그룹/허용 목록 검사
//! - **ToolRepetitionDetector**: 연속 동일 호출 차단
//! - **TurnDriver**: 프로바이더 스트림 -> 블록 -> present
//!
//! ## 사용 예
//!
//! ```ignore
//! use warden_agent::{AutoApprove, Presenter, TurnDriver};
//!
//! let presenter = Arc::new(
//!     Presenter::from_config(&config, task, governance, Arc::new(AutoApprove))
//!         .with_handler(ToolName::ReadFile, Arc::new(ReadFileHandler)),
//! );
//! let mut driver = TurnDriver::new(resolver, presenter.clone());
//!
//! let outcome = driver.run(provider_chunks).await?;
//! let user_content = outcome.user_content;
//! ```

pub mod callbacks;
pub mod content;
pub mod driver;
pub mod handler;
pub mod interaction;
pub mod presenter;
pub mod repetition;
pub mod response;
pub mod turn;
pub mod validation;

// ============================================================================
// Primary Exports
// ============================================================================

pub use callbacks::ToolCallbacks;
pub use content::{sanitize_tool_use_id, AssistantContent, ResponsePart, ToolResponse, UserContent};
pub use driver::{TurnDriver, TurnOutcome};
pub use handler::{Checkpointer, HandlerRegistry, ToolHandler};
pub use interaction::{AskKind, AskResponse, AskResponseKind, AutoApprove, SayKind, UserInteraction};
pub use presenter::Presenter;
pub use turn::{ToolUsage, TurnState};

// Policy
pub use repetition::{RepetitionCheck, RepetitionPrompt, ToolRepetitionDetector};
pub use validation::{
    builtin_modes, GroupEntry, ModeConfig, ToolGroup, ValidationError, ValidationPolicy,
    ALWAYS_AVAILABLE_TOOLS,
};
