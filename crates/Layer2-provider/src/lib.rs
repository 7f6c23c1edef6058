//! # warden-provider
//!
//! Provider stream adapters for Warden.
//! Turns provider-specific tool-call fragments into normalized events.
//!
//! ## Features
//! - Index-keyed chunk aggregation with late id/name handling
//! - OpenAI-compatible SSE line parsing
//! - Async stream adapter over any chunk source

pub mod aggregator;
pub mod chunk;
pub mod openai;
pub mod stream;

pub use aggregator::RawChunkAggregator;
pub use chunk::{
    AggregatedEvent, ProviderChunk, RawToolCallChunk, ToolCallEvent, TOOL_CALLS_FINISH_REASON,
};
pub use openai::parse_sse_line;
pub use stream::{aggregate, AggregatedStream};
