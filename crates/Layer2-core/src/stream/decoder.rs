//! Argument Stream Decoder
//!
//! Accumulates argument text per call id, yields display-only partial
//! calls while streaming, and resolves the final call when the stream for
//! that id ends.

use super::partial_json::parse_partial;
use crate::tool::{is_mcp_name, RawToolCall, ResolvedToolCall, ToolCallResolver};
use std::collections::HashMap;
use warden_foundation::{Error, Result};

#[derive(Debug)]
struct StreamingCall {
    name: String,
    text: String,
}

/// 호출 id별 인자 스트림 디코더
#[derive(Debug, Default)]
pub struct ArgumentStreamDecoder {
    calls: HashMap<String, StreamingCall>,
}

impl ArgumentStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 호출 추적 시작 (같은 id면 상태 초기화)
    pub fn start(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        tracing::trace!(call_id = %id, tool = %name, "Tool call stream started");
        if self
            .calls
            .insert(
                id.clone(),
                StreamingCall {
                    name,
                    text: String::new(),
                },
            )
            .is_some()
        {
            tracing::debug!(call_id = %id, "Restarted tool call stream");
        }
    }

    /// 인자 조각 추가 후 표시용 부분 호출 반환
    ///
    /// Unknown ids and dynamic (MCP) calls yield nothing.
    pub fn process_delta(
        &mut self,
        id: &str,
        delta: &str,
        resolver: &ToolCallResolver,
    ) -> Option<ResolvedToolCall> {
        let Some(call) = self.calls.get_mut(id) else {
            tracing::trace!(call_id = %id, "Delta for unknown call id");
            return None;
        };
        call.text.push_str(delta);

        if is_mcp_name(&call.name) {
            return None;
        }
        let partial = parse_partial(&call.text)?;
        resolver.resolve_partial(id, &call.name, &partial)
    }

    /// 호출 종료: 누적 텍스트로 최종 해석
    ///
    /// State for the id is removed whether or not resolution succeeds.
    pub fn finalize(&mut self, id: &str, resolver: &ToolCallResolver) -> Result<ResolvedToolCall> {
        let call = self
            .calls
            .remove(id)
            .ok_or_else(|| Error::UnknownCall(id.to_string()))?;
        resolver.try_resolve(&RawToolCall::new(id, call.name, call.text))
    }

    /// 추적 중인 호출 이름
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.calls.get(id).map(|call| call.name.as_str())
    }

    pub fn has(&self, id: &str) -> bool {
        self.calls.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// 모든 상태 제거 (새 요청 시작)
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}
