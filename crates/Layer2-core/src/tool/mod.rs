//! Tool 시스템 - 카탈로그, 인자, 해석기
//!
//! - `names`: 정적 카탈로그 이름과 파라미터 어휘
//! - `descriptor`: 도구별 필드/변환/표시 디스패치 테이블
//! - `args`: 도구별 타입 인자
//! - `catalog`: 별칭 해석
//! - `custom`: 동적 커스텀 도구 레지스트리
//! - `mcp_name`: 복합(MCP) 이름 파싱
//! - `resolver`: 원시 호출 -> 해석된 호출

pub mod args;
pub mod call;
pub mod catalog;
pub mod coerce;
pub mod custom;
pub mod descriptor;
pub mod mcp_name;
pub mod names;
pub mod resolver;

pub use args::{FileEntry, LineRange, NativeArgs, ReadFileArgs};
pub use call::{McpToolUse, ResolvedToolCall, ToolArguments, ToolIdent, ToolUse};
pub use catalog::ToolCatalog;
pub use custom::{CustomTool, CustomToolContext, CustomToolRegistry};
pub use descriptor::{describe_call, descriptor, DisplayParams, ToolDescriptor};
pub use mcp_name::{is_mcp_name, normalize_mcp_name, McpToolName};
pub use names::{is_known_param, ToolName, PARAM_NAMES};
pub use resolver::{RawToolCall, ToolCallResolver};
