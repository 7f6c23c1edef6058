//! Per-request tool-call stream state
//!
//! Owns the chunk aggregator and the argument decoder for one task so
//! nothing leaks between upstream requests.

use super::decoder::ArgumentStreamDecoder;
use crate::tool::{ResolvedToolCall, ToolCallResolver};
use warden_foundation::Error;
use warden_provider::{RawChunkAggregator, RawToolCallChunk, ToolCallEvent};

/// 스트림 이벤트 처리 결과
#[derive(Debug)]
pub enum StreamUpdate {
    /// 표시 전용 부분 호출
    Partial(ResolvedToolCall),
    /// 실행 가능한 최종 호출
    Complete(ResolvedToolCall),
    /// 최종 해석 실패 (호출 id는 여전히 결과가 필요함)
    Failed {
        id: String,
        name: String,
        error: Error,
    },
}

impl StreamUpdate {
    pub fn id(&self) -> Option<&str> {
        match self {
            StreamUpdate::Partial(call) | StreamUpdate::Complete(call) => call.id(),
            StreamUpdate::Failed { id, .. } => Some(id),
        }
    }
}

/// Tool call 스트림 상태 (aggregator + decoder)
#[derive(Debug)]
pub struct ToolCallStreamState {
    aggregator: RawChunkAggregator,
    decoder: ArgumentStreamDecoder,
    resolver: ToolCallResolver,
}

impl ToolCallStreamState {
    pub fn new(resolver: ToolCallResolver) -> Self {
        Self {
            aggregator: RawChunkAggregator::new(),
            decoder: ArgumentStreamDecoder::new(),
            resolver,
        }
    }

    pub fn resolver(&self) -> &ToolCallResolver {
        &self.resolver
    }

    /// 새 업스트림 요청 시작: 모든 누적 상태 초기화
    pub fn begin_request(&mut self) {
        if !self.aggregator.is_empty() || !self.decoder.is_empty() {
            tracing::debug!(
                trackers = self.aggregator.len(),
                calls = self.decoder.len(),
                "Discarding stream state from previous request"
            );
        }
        self.aggregator.clear();
        self.decoder.clear();
    }

    /// 원시 조각 처리
    pub fn process_chunk(&mut self, chunk: RawToolCallChunk) -> Vec<StreamUpdate> {
        let events = self.aggregator.process_chunk(chunk);
        self.apply_events(events)
    }

    /// 완료 사유 처리 (`tool_calls`이면 시작된 호출 모두 종료)
    pub fn process_finish_reason(&mut self, reason: Option<&str>) -> Vec<StreamUpdate> {
        let events = self.aggregator.process_finish_reason(reason);
        self.apply_events(events)
    }

    /// 스트림 종료: 남은 호출 종료 후 정리
    pub fn finish(&mut self) -> Vec<StreamUpdate> {
        let events = self.aggregator.finalize();
        let updates = self.apply_events(events);

        // Ended 없이 남은 호출 (start 이벤트만 직접 들어온 경우)
        if !self.decoder.is_empty() {
            tracing::debug!(calls = self.decoder.len(), "Dropping unfinished tool calls");
            self.decoder.clear();
        }
        updates
    }

    /// 정규화된 이벤트 하나 처리
    pub fn handle_event(&mut self, event: ToolCallEvent) -> Option<StreamUpdate> {
        match event {
            ToolCallEvent::Started { id, name } => {
                self.decoder.start(id, name);
                None
            }
            ToolCallEvent::Delta { id, delta } => self
                .decoder
                .process_delta(&id, &delta, &self.resolver)
                .map(StreamUpdate::Partial),
            ToolCallEvent::Ended { id } => {
                let name = self.decoder.name_of(&id).unwrap_or_default().to_string();
                match self.decoder.finalize(&id, &self.resolver) {
                    Ok(call) => {
                        tracing::debug!(call_id = %id, tool = %name, "Tool call finalized");
                        Some(StreamUpdate::Complete(call))
                    }
                    Err(Error::UnknownCall(_)) => {
                        tracing::trace!(call_id = %id, "End for untracked call id");
                        None
                    }
                    Err(error) => {
                        tracing::error!(call_id = %id, tool = %name, error = %error, "Failed to resolve tool call");
                        Some(StreamUpdate::Failed { id, name, error })
                    }
                }
            }
        }
    }

    fn apply_events(&mut self, events: Vec<ToolCallEvent>) -> Vec<StreamUpdate> {
        events
            .into_iter()
            .filter_map(|event| self.handle_event(event))
            .collect()
    }
}
