//! Turn driver - 프로바이더 스트림을 Presenter 블록으로 연결
//!
//! Feeds provider chunks through the aggregator and the argument decoder,
//! keeps the presenter's block list in sync, and triggers a presentation
//! pass after every update. The stream is always read to the end so every
//! call id still gets its result after a rejection or a failed handler.

use crate::content::{AssistantContent, UserContent};
use crate::presenter::Presenter;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use warden_core::tool::is_mcp_name;
use warden_core::{
    DisplayParams, ResolvedToolCall, StreamUpdate, ToolCallResolver, ToolCallStreamState,
    ToolIdent, ToolName, ToolUse,
};
use warden_foundation::{Error, Result};
use warden_provider::{aggregate, AggregatedEvent, ProviderChunk};

/// 한 턴 처리 결과
#[derive(Debug)]
pub struct TurnOutcome {
    /// 다음 요청에 보낼 사용자 콘텐츠
    pub user_content: Vec<UserContent>,
    /// 처음 실패한 핸들러의 에러 (해당 호출의 에러 결과는 이미 기록됨)
    pub handler_error: Option<Error>,
}

/// 한 턴의 스트림 처리기
#[derive(Debug)]
pub struct TurnDriver {
    stream_state: ToolCallStreamState,
    presenter: Arc<Presenter>,
}

impl TurnDriver {
    pub fn new(resolver: ToolCallResolver, presenter: Arc<Presenter>) -> Self {
        Self {
            stream_state: ToolCallStreamState::new(resolver),
            presenter,
        }
    }

    pub fn presenter(&self) -> &Arc<Presenter> {
        &self.presenter
    }

    /// 업스트림 응답 하나를 끝까지 처리
    ///
    /// Only an abort ends the turn early. A failing handler is recorded in
    /// [`TurnOutcome::handler_error`] and the remaining blocks are still
    /// presented.
    pub async fn run<S>(&mut self, chunks: S) -> Result<TurnOutcome>
    where
        S: Stream<Item = ProviderChunk> + Send + 'static,
    {
        self.stream_state.begin_request();
        self.presenter.begin_turn();

        let mut handler_error = None;
        let mut events = aggregate(chunks);
        while let Some(event) = events.next().await {
            match event {
                AggregatedEvent::Text(text) => self.presenter.append_text(&text),
                AggregatedEvent::ToolCall(event) => {
                    if let Some(update) = self.stream_state.handle_event(event) {
                        self.apply(update);
                    }
                }
            }
            self.present(&mut handler_error).await?;
        }

        for update in self.stream_state.finish() {
            self.apply(update);
        }
        self.presenter.mark_stream_complete();
        self.present(&mut handler_error).await?;

        Ok(TurnOutcome {
            user_content: self.presenter.take_user_content(),
            handler_error,
        })
    }

    /// 처리 가능한 블록을 모두 진행 (핸들러 에러는 기록 후 계속)
    async fn present(&self, handler_error: &mut Option<Error>) -> Result<()> {
        loop {
            match self.presenter.present().await {
                Ok(()) => return Ok(()),
                Err(e @ Error::Aborted(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "Tool handler failed; continuing with remaining blocks");
                    handler_error.get_or_insert(e);
                }
            }
        }
    }

    /// 스트림 업데이트를 블록에 반영
    pub fn apply(&self, update: StreamUpdate) {
        match update {
            StreamUpdate::Partial(call) | StreamUpdate::Complete(call) => {
                self.presenter.upsert_block(AssistantContent::from(call));
            }
            StreamUpdate::Failed { id, name, error } => {
                tracing::debug!(call_id = %id, tool = %name, error = %error, "Presenting failed tool call");
                let ident = if is_mcp_name(&name) {
                    ToolIdent::Catalog(ToolName::UseMcpTool)
                } else {
                    self.stream_state
                        .resolver()
                        .identify(&name)
                        .unwrap_or(ToolIdent::Unknown(name.clone()))
                };
                let block = ToolUse {
                    id: (!id.is_empty()).then_some(id),
                    original_name: (name != ident.as_str()).then(|| name.clone()),
                    name: ident,
                    params: DisplayParams::new(),
                    arguments: None,
                    partial: false,
                    used_legacy_format: false,
                };
                self.presenter
                    .upsert_block(AssistantContent::from(ResolvedToolCall::ToolUse(block)));
            }
        }
    }
}
