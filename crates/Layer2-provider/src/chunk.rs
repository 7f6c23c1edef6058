//! Raw chunk and event types
//!
//! Providers stream tool calls as fragments addressed by a positional
//! index. The id and name may arrive late, and argument text may arrive
//! before the name.

use serde::{Deserialize, Serialize};

/// Completion reason that closes every started tool call
pub const TOOL_CALLS_FINISH_REASON: &str = "tool_calls";

/// One provider-specific tool-call fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToolCallChunk {
    /// Position of the call within the response
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Argument text fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl RawToolCallChunk {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }
}

/// Normalized tool-call lifecycle event
///
/// For a given id: `Started` precedes every `Delta`, which precede `Ended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCallEvent {
    Started { id: String, name: String },
    Delta { id: String, delta: String },
    Ended { id: String },
}

impl ToolCallEvent {
    /// Call id this event belongs to
    pub fn id(&self) -> &str {
        match self {
            ToolCallEvent::Started { id, .. }
            | ToolCallEvent::Delta { id, .. }
            | ToolCallEvent::Ended { id } => id,
        }
    }
}

/// Provider stream item fed to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderChunk {
    /// Assistant text delta
    Text(String),

    /// Tool-call fragment
    ToolCall(RawToolCallChunk),

    /// Completion reason reported by the provider
    Finish(String),

    /// Explicit end of stream
    Done,
}

/// Output of the aggregated provider stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatedEvent {
    Text(String),
    ToolCall(ToolCallEvent),
}
