//! Presentation Orchestrator
//!
//! Walks the assistant message's content blocks one at a time and turns
//! each complete tool block into exactly one tool result. Re-entrant
//! calls coalesce into a single continuation through a pending flag.

use crate::callbacks::ToolCallbacks;
use crate::content::{AssistantContent, UserContent};
use crate::handler::{Checkpointer, HandlerRegistry, ToolHandler};
use crate::interaction::{AskResponse, AskResponseKind, SayKind, UserInteraction};
use crate::repetition::ToolRepetitionDetector;
use crate::response;
use crate::turn::TurnState;
use crate::validation::ValidationPolicy;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use warden_core::tool::args::UseMcpToolArgs;
use warden_core::{
    CustomToolContext, CustomToolRegistry, DisplayParams, Governance, HookEngine,
    HookInvocationContext, McpToolUse, NativeArgs, TaskInfo, ToolArguments, ToolCatalog,
    ToolIdent, ToolName, ToolUse,
};
use warden_foundation::{Error, Result, WardenConfig};

/// 커스텀 도구 사용 기록 이름
const CUSTOM_TOOL_USAGE: &str = "custom_tool";

// ============================================================================
// PresentState
// ============================================================================

#[derive(Debug, Default)]
struct PresentState {
    blocks: Vec<AssistantContent>,
    index: usize,
    stream_complete: bool,
    content_ready: bool,
    locked: bool,
    pending: bool,
}

/// single-flight 잠금 해제 가드 (에러/패닉 경로용)
struct FlightGuard<'a> {
    state: &'a Mutex<PresentState>,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().locked = false;
        }
    }
}

// ============================================================================
// Presenter
// ============================================================================

/// Presentation Orchestrator
pub struct Presenter {
    task: TaskInfo,
    handlers: HandlerRegistry,
    custom_tools: Arc<CustomToolRegistry>,
    hooks: Arc<HookEngine>,
    governance: Arc<dyn Governance>,
    interaction: Arc<dyn UserInteraction>,
    policy: RwLock<ValidationPolicy>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    repetition: Mutex<ToolRepetitionDetector>,
    turn: Arc<Mutex<TurnState>>,
    state: Mutex<PresentState>,
    abort: Arc<AtomicBool>,
}

impl Presenter {
    /// 기본 정책, Hook 없음
    pub fn new(
        task: TaskInfo,
        governance: Arc<dyn Governance>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        Self {
            task,
            handlers: HandlerRegistry::new(),
            custom_tools: Arc::new(CustomToolRegistry::new()),
            hooks: Arc::new(HookEngine::new()),
            governance,
            interaction,
            policy: RwLock::new(ValidationPolicy::new()),
            checkpointer: None,
            repetition: Mutex::new(ToolRepetitionDetector::default()),
            turn: Arc::new(Mutex::new(TurnState::new())),
            state: Mutex::new(PresentState::default()),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 설정에서 정책, 반복 제한, 내장 Hook 구성
    pub fn from_config(
        config: &WardenConfig,
        task: TaskInfo,
        governance: Arc<dyn Governance>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        let catalog = ToolCatalog::from_config(config);
        Self::new(task, governance, interaction)
            .with_policy(ValidationPolicy::from_config(config, &catalog))
            .with_hooks(HookEngine::from_settings(&config.hooks))
            .with_repetition_limit(config.repetition_limit)
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_handler(mut self, tool: ToolName, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.register(tool, handler);
        self
    }

    pub fn with_custom_tools(mut self, custom_tools: Arc<CustomToolRegistry>) -> Self {
        self.custom_tools = custom_tools;
        self
    }

    pub fn with_hooks(mut self, hooks: HookEngine) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = RwLock::new(policy);
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn with_repetition_limit(mut self, limit: u32) -> Self {
        self.repetition = Mutex::new(ToolRepetitionDetector::new(limit));
        self
    }

    /// 외부에서 공유하는 중단 플래그 사용
    pub fn with_abort_flag(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    pub fn task(&self) -> &TaskInfo {
        &self.task
    }

    pub fn hooks(&self) -> &HookEngine {
        &self.hooks
    }

    pub fn turn(&self) -> Arc<Mutex<TurnState>> {
        self.turn.clone()
    }

    /// 현재 모드 전환
    pub fn set_mode(&self, mode: &str) -> Result<()> {
        self.policy.write().set_mode(mode).map_err(Error::from)
    }

    pub fn mode(&self) -> String {
        self.policy.read().mode().to_string()
    }

    // ========================================================================
    // Abort
    // ========================================================================

    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    /// 새 턴 시작 (블록, 인덱스, 턴 플래그 초기화)
    pub fn begin_turn(&self) {
        *self.state.lock() = PresentState::default();
        self.turn.lock().begin_turn();
    }

    /// 텍스트 조각 추가 (마지막 블록이 부분 텍스트면 이어 붙임)
    pub fn append_text(&self, delta: &str) {
        let mut state = self.state.lock();
        if let Some(AssistantContent::Text {
            content,
            partial: true,
        }) = state.blocks.last_mut()
        {
            content.push_str(delta);
            return;
        }
        state.blocks.push(AssistantContent::text(delta, true));
    }

    /// 도구 블록 추가 또는 같은 id 블록 교체
    ///
    /// A trailing partial text block is completed first, since text never
    /// continues after a tool call starts.
    pub fn upsert_block(&self, block: AssistantContent) {
        let mut state = self.state.lock();
        if let Some(id) = block.call_id() {
            if let Some(existing) = state
                .blocks
                .iter_mut()
                .find(|b| b.call_id() == Some(id))
            {
                *existing = block;
                return;
            }
        }
        complete_trailing_text(&mut state.blocks);
        state.blocks.push(block);
    }

    /// 스트림 종료 표시
    ///
    /// Blocks still partial at this point can never complete. Text is
    /// finalized as is; tool blocks become complete calls without
    /// arguments so they receive a single error result.
    pub fn mark_stream_complete(&self) {
        let mut state = self.state.lock();
        for block in state.blocks.iter_mut() {
            match block {
                AssistantContent::Text { partial, .. } => *partial = false,
                AssistantContent::ToolUse(tool) if tool.partial => {
                    tracing::debug!(call_id = ?tool.id, tool = %tool.name, "Tool call never finalized");
                    tool.partial = false;
                    tool.arguments = None;
                }
                AssistantContent::McpToolUse(mcp) => mcp.partial = false,
                _ => {}
            }
        }
        state.stream_complete = true;
        if state.index >= state.blocks.len() {
            state.content_ready = true;
        }
    }

    pub fn blocks(&self) -> Vec<AssistantContent> {
        self.state.lock().blocks.clone()
    }

    /// 모든 블록 처리 완료 여부 (다음 요청 준비됨)
    pub fn is_content_ready(&self) -> bool {
        self.state.lock().content_ready
    }

    /// 다음 요청에 보낼 사용자 콘텐츠
    pub fn take_user_content(&self) -> Vec<UserContent> {
        self.turn.lock().take_user_content()
    }

    // ========================================================================
    // Present loop
    // ========================================================================

    /// 현재 블록부터 처리 가능한 만큼 진행
    ///
    /// While a walk is in flight, further calls only set the pending flag
    /// and return; the running walk picks the update up before it exits.
    pub async fn present(&self) -> Result<()> {
        self.check_abort()?;

        {
            let mut state = self.state.lock();
            if state.locked {
                state.pending = true;
                return Ok(());
            }
            state.locked = true;
            state.pending = false;
        }
        let mut guard = FlightGuard {
            state: &self.state,
            armed: true,
        };

        loop {
            self.check_abort()?;

            let block = {
                let mut state = self.state.lock();
                match state.blocks.get(state.index) {
                    Some(block) => block.clone(),
                    None => {
                        if state.stream_complete {
                            state.content_ready = true;
                        }
                        state.pending = false;
                        state.locked = false;
                        guard.armed = false;
                        return Ok(());
                    }
                }
            };

            let outcome = self.present_block(&block).await;

            let advance = should_advance(&block, &self.turn.lock());

            let mut state = self.state.lock();
            if advance {
                state.index += 1;
                if state.index >= state.blocks.len() && state.stream_complete {
                    state.content_ready = true;
                }
            }

            // 결과는 이미 기록됨; 블록을 넘긴 뒤 에러 전달
            if let Err(e) = outcome {
                state.locked = false;
                guard.armed = false;
                return Err(e);
            }

            if advance && state.index < state.blocks.len() {
                state.pending = false;
                continue;
            }

            if state.pending {
                state.pending = false;
                continue;
            }

            state.locked = false;
            guard.armed = false;
            return Ok(());
        }
    }

    fn check_abort(&self) -> Result<()> {
        if self.is_aborted() {
            return Err(Error::Aborted(format!("task {} aborted", self.task.task_id)));
        }
        Ok(())
    }

    async fn present_block(&self, block: &AssistantContent) -> Result<()> {
        match block {
            AssistantContent::Text { content, partial } => {
                self.present_text(content, *partial).await;
                Ok(())
            }
            AssistantContent::McpToolUse(mcp) => self.present_mcp(mcp).await,
            AssistantContent::ToolUse(tool) => self.present_tool(tool).await,
        }
    }

    async fn present_text(&self, content: &str, partial: bool) {
        {
            let turn = self.turn.lock();
            if turn.did_reject_tool || turn.did_already_use_tool {
                return;
            }
        }
        let text = response::strip_thinking_tags(content);
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.interaction.say(SayKind::Text, &text, &[], partial).await {
            tracing::warn!(error = %e, "Failed to display assistant text");
        }
    }

    async fn present_mcp(&self, mcp: &McpToolUse) -> Result<()> {
        if self.turn.lock().did_reject_tool {
            if let Some(id) = &mcp.id {
                let message = response::mcp_rejected_after_previous(&mcp.name, mcp.partial);
                self.turn.lock().push_tool_result(id, message, true);
            }
            return Ok(());
        }
        self.present_tool(&synthesize_use_mcp_tool(mcp)).await
    }

    async fn present_tool(&self, tool: &ToolUse) -> Result<()> {
        let name = tool.name.as_str().to_string();

        // 1. id 없는 호출
        let Some(call_id) = tool.id.clone() else {
            {
                let mut turn = self.turn.lock();
                turn.record_mistake();
                turn.record_failure(&name, response::MISSING_TOOL_USE_ID);
                turn.push_content(UserContent::text(response::MISSING_TOOL_USE_ID));
                turn.did_already_use_tool = true;
            }
            self.say_error(response::MISSING_TOOL_USE_ID).await;
            return Ok(());
        };

        // 2. 이전 거부 이후
        if self.turn.lock().did_reject_tool {
            let message = response::rejected_after_previous(&tool.describe(), tool.partial);
            self.turn.lock().push_tool_result(&call_id, message, true);
            return Ok(());
        }

        // 8. 부분 블록은 실행하지 않음
        if tool.partial {
            return Ok(());
        }

        if let ToolIdent::Unknown(unknown) = &tool.name {
            let message = response::unknown_tool(unknown);
            self.fail_call(&call_id, &name, &message).await;
            return Ok(());
        }

        // 3. 타입 인자 없음
        if tool.arguments.is_none()
            || (tool.name.catalog().is_some() && tool.native_args().is_none())
        {
            let message = response::missing_arguments(&name);
            {
                let mut turn = self.turn.lock();
                turn.record_mistake();
                turn.record_failure(&name, &message);
            }
            self.push_error(&call_id, &message);
            return Ok(());
        }

        let usage_name = match &tool.name {
            ToolIdent::Custom(_) => CUSTOM_TOOL_USAGE,
            _ => name.as_str(),
        };
        self.turn.lock().record_usage(usage_name);

        if tool.name.catalog() == Some(ToolName::ReadFile) && tool.used_legacy_format {
            tracing::info!(
                task_id = %self.task.task_id,
                model = ?self.task.model_id,
                "read_file called with legacy files format"
            );
        }

        // 4. 정책 검증
        let validation = self.policy.read().validate(tool);
        if let Err(e) = validation {
            tracing::debug!(call_id = %call_id, tool = %name, error = %e, "Tool use rejected by policy");
            self.turn.lock().record_mistake();
            self.push_error(&call_id, &e.to_string());
            return Ok(());
        }

        // 5. 반복 감지
        let check = self.repetition.lock().check(tool);
        if !check.allow_execution {
            if let Some(prompt) = check.ask_user {
                match self.interaction.ask(prompt.kind, Some(&prompt.message)).await {
                    Ok(answer) => self.record_repetition_feedback(answer).await,
                    Err(e) => {
                        tracing::warn!(call_id = %call_id, error = %e, "Repetition prompt failed")
                    }
                }
            }
            self.push_error(&call_id, &response::repetition_limit(&name));
            return Ok(());
        }

        // 6. pre-hook
        let mut ctx = HookInvocationContext::new(
            self.task.clone(),
            self.governance.clone(),
            name.clone(),
            tool.arguments_value(),
        )
        .with_call_id(Some(call_id.clone()));

        let verdict = self.hooks.run_pre(&ctx).await;
        if !verdict.allow {
            let reason = verdict.denial_reason().to_string();
            tracing::info!(call_id = %call_id, tool = %name, reason = %reason, "Tool call denied by hook");
            self.say_error(&reason).await;
            {
                let mut turn = self.turn.lock();
                turn.push_tool_result(&call_id, response::tool_error(&reason), true);
                turn.record_failure(&name, &reason);
                turn.did_already_use_tool = true;
            }
            ctx.record_failure(reason);
            self.hooks.run_post(&ctx).await;
            return Ok(());
        }

        // 7. 디스패치
        if tool
            .name
            .catalog()
            .is_some_and(|t| t.is_file_mutation() || t == ToolName::NewTask)
        {
            self.checkpoint_once().await;
        }

        let callbacks = ToolCallbacks::new(
            call_id.clone(),
            name.clone(),
            tool.describe(),
            self.turn.clone(),
            self.interaction.clone(),
        );

        let outcome = match &tool.name {
            ToolIdent::Catalog(catalog_tool) => match self.handlers.get(*catalog_tool) {
                Some(handler) => handler.handle(tool, &callbacks).await,
                None => Err(Error::tool_execution(
                    name.clone(),
                    "no handler is registered for this tool",
                )),
            },
            ToolIdent::Custom(custom) => self.run_custom_tool(custom, tool, &callbacks).await,
            ToolIdent::Unknown(_) => Ok(()),
        };

        match &outcome {
            Ok(()) => {
                if !callbacks.has_result() {
                    callbacks.push_tool_result(response::NO_OUTPUT);
                }
                ctx.record_success(callbacks.result_text().unwrap_or_default());
            }
            Err(e) => {
                tracing::error!(call_id = %call_id, tool = %name, error = %e, "Tool handler failed");
                if !callbacks.has_result() {
                    callbacks.push_error_result(&e.to_string());
                }
                self.turn.lock().record_failure(&name, &e.to_string());
                ctx.result = callbacks.result_text();
                ctx.record_failure(e.to_string());
            }
        }

        self.hooks.run_post(&ctx).await;
        outcome
    }

    async fn run_custom_tool(
        &self,
        name: &str,
        tool: &ToolUse,
        callbacks: &ToolCallbacks,
    ) -> Result<()> {
        let Some(custom) = self.custom_tools.get(name) else {
            self.fail_call(callbacks.call_id(), name, &response::unknown_tool(name))
                .await;
            return Ok(());
        };

        let args = tool
            .arguments
            .as_ref()
            .map(ToolArguments::to_value)
            .unwrap_or_else(|| Value::Object(Map::new()));

        if let Err(e) = custom.validate(&args) {
            let message = format!("Custom tool \"{}\" argument validation failed: {}", name, e);
            self.turn.lock().record_mistake();
            self.say_error(&message).await;
            callbacks.push_error_result(&message);
            return Ok(());
        }

        let ctx = CustomToolContext {
            task_id: self.task.task_id.clone(),
            call_id: callbacks.call_id().to_string(),
            cwd: self.task.cwd.clone(),
        };

        match custom.execute(args, &ctx).await {
            Ok(output) => {
                tracing::debug!(tool = %name, "Custom tool executed");
                callbacks.push_tool_result(output);
                self.turn.lock().reset_mistakes();
            }
            Err(e) => {
                {
                    let mut turn = self.turn.lock();
                    turn.record_mistake();
                    turn.record_failure(CUSTOM_TOOL_USAGE, &e.to_string());
                }
                callbacks
                    .handle_error(&format!("executing custom tool \"{}\"", name), &e)
                    .await;
            }
        }
        Ok(())
    }

    /// 반복 경고에 대한 사용자 메시지를 피드백으로 기록
    async fn record_repetition_feedback(&self, answer: AskResponse) {
        if answer.kind != AskResponseKind::Message {
            return;
        }
        let text = answer.text.unwrap_or_default();
        {
            let mut turn = self.turn.lock();
            turn.push_content(UserContent::text(response::repetition_feedback(&text)));
            turn.push_images(answer.images.clone());
        }
        if let Err(e) = self
            .interaction
            .say(SayKind::UserFeedback, &text, &answer.images, false)
            .await
        {
            tracing::warn!(error = %e, "Failed to display user feedback");
        }
    }

    async fn checkpoint_once(&self) {
        let Some(checkpointer) = &self.checkpointer else {
            return;
        };
        if self.turn.lock().did_checkpoint {
            return;
        }
        match checkpointer.save().await {
            Ok(()) => self.turn.lock().did_checkpoint = true,
            Err(e) => tracing::error!(error = %e, "Failed to save checkpoint"),
        }
    }

    /// 실수로 집계되는 호출 실패 (표시 + 에러 결과)
    async fn fail_call(&self, call_id: &str, tool: &str, message: &str) {
        {
            let mut turn = self.turn.lock();
            turn.record_mistake();
            turn.record_failure(tool, message);
        }
        self.say_error(message).await;
        self.push_error(call_id, message);
    }

    fn push_error(&self, call_id: &str, message: &str) {
        self.turn
            .lock()
            .push_tool_result(call_id, response::tool_error(message), true);
    }

    async fn say_error(&self, message: &str) {
        if let Err(e) = self.interaction.say(SayKind::Error, message, &[], false).await {
            tracing::warn!(error = %e, "Failed to display error");
        }
    }
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("task", &self.task)
            .field("handlers", &self.handlers)
            .field("hooks", &self.hooks)
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// 처리한 블록을 넘어갈지 결정
///
/// A partial tool block is only passed once it has its result (or has no
/// id to attach one to); otherwise its complete version, upserted later in
/// place, would never be presented.
fn should_advance(block: &AssistantContent, turn: &TurnState) -> bool {
    if !block.is_partial() {
        return true;
    }
    match block {
        AssistantContent::Text { .. } => turn.did_reject_tool || turn.did_already_use_tool,
        _ => block.call_id().map_or(true, |id| turn.has_result(id)),
    }
}

fn complete_trailing_text(blocks: &mut [AssistantContent]) {
    if let Some(AssistantContent::Text { partial, .. }) = blocks.last_mut() {
        *partial = false;
    }
}

/// 동적 호출을 `use_mcp_tool` 카탈로그 호출로 변환
fn synthesize_use_mcp_tool(mcp: &McpToolUse) -> ToolUse {
    let mut params = DisplayParams::new();
    params.insert("server_name".into(), mcp.server_name.clone());
    params.insert("tool_name".into(), mcp.tool_name.clone());
    params.insert("arguments".into(), mcp.arguments.to_string());

    ToolUse {
        id: mcp.id.clone(),
        name: ToolIdent::Catalog(ToolName::UseMcpTool),
        original_name: Some(mcp.name.clone()),
        params,
        arguments: Some(ToolArguments::Native(NativeArgs::UseMcpTool(UseMcpToolArgs {
            server_name: mcp.server_name.clone(),
            tool_name: mcp.tool_name.clone(),
            arguments: Some(mcp.arguments.clone()),
        }))),
        partial: mcp.partial,
        used_legacy_format: false,
    }
}
