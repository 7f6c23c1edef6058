//! Tool callbacks - 핸들러에 전달되는 승인/결과/에러 콜백
//!
//! One instance per dispatched call. `push_tool_result` is idempotent:
//! the first result wins and later ones are logged and dropped.

use crate::content::{ResponsePart, ToolResponse};
use crate::interaction::{AskKind, SayKind, UserInteraction};
use crate::response;
use crate::turn::TurnState;
use parking_lot::Mutex;
use std::sync::Arc;
use warden_foundation::{Error, Result};

#[derive(Debug, Clone)]
struct Feedback {
    text: String,
    images: Vec<String>,
}

#[derive(Debug, Default)]
struct CallbackState {
    pushed: bool,
    result: Option<String>,
    approval_feedback: Option<Feedback>,
}

/// 도구 호출 하나에 대한 콜백 묶음
pub struct ToolCallbacks {
    call_id: String,
    tool_name: String,
    description: String,
    turn: Arc<Mutex<TurnState>>,
    interaction: Arc<dyn UserInteraction>,
    state: Mutex<CallbackState>,
}

impl ToolCallbacks {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        description: impl Into<String>,
        turn: Arc<Mutex<TurnState>>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            description: description.into(),
            turn,
            interaction,
            state: Mutex::new(CallbackState::default()),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// 호출 설명 (예: `[read_file for 'a.rs']`)
    pub fn description(&self) -> &str {
        &self.description
    }

    /// 사용자 상호작용 (핸들러가 직접 메시지를 표시할 때)
    pub fn interaction(&self) -> &Arc<dyn UserInteraction> {
        &self.interaction
    }

    /// 승인 요청
    ///
    /// A denial pushes the denial result and marks the turn as rejected.
    /// Feedback given with an approval is merged in front of the result
    /// the handler pushes later.
    pub async fn ask_approval(&self, kind: AskKind, message: Option<&str>) -> Result<bool> {
        let answer = self.interaction.ask(kind, message).await?;
        let feedback = answer.feedback().map(str::to_string);

        if !answer.is_approved() {
            match feedback {
                Some(text) => {
                    self.interaction
                        .say(SayKind::UserFeedback, &text, &answer.images, false)
                        .await?;
                    let mut parts = vec![ResponsePart::Text {
                        text: response::tool_denied_with_feedback(&text),
                    }];
                    parts.extend(
                        answer
                            .images
                            .iter()
                            .map(|source| ResponsePart::Image { source: source.clone() }),
                    );
                    self.push_tool_result(ToolResponse::Parts(parts));
                }
                None => {
                    self.push_tool_result(response::tool_denied());
                }
            }
            self.turn.lock().did_reject_tool = true;
            tracing::debug!(call_id = %self.call_id, tool = %self.tool_name, "Tool rejected by user");
            return Ok(false);
        }

        if let Some(text) = feedback {
            self.interaction
                .say(SayKind::UserFeedback, &text, &answer.images, false)
                .await?;
            self.state.lock().approval_feedback = Some(Feedback {
                text,
                images: answer.images,
            });
        }
        Ok(true)
    }

    /// 도구 결과 기록 (첫 호출만 반영)
    pub fn push_tool_result(&self, result: impl Into<ToolResponse>) -> bool {
        self.push(result.into(), false)
    }

    /// 에러 결과 기록 (첫 호출만 반영)
    pub fn push_error_result(&self, message: &str) -> bool {
        self.push(ToolResponse::Text(response::tool_error(message)), true)
    }

    /// 에러 표시 후 에러 결과 기록
    pub async fn handle_error(&self, action: &str, error: &Error) {
        let text = error.to_string();
        if let Err(e) = self
            .interaction
            .say(SayKind::Error, &format!("Error {}:\n{}", action, text), &[], false)
            .await
        {
            tracing::warn!(error = %e, "Failed to display tool error");
        }
        self.push_error_result(&response::error_while(action, &text));
    }

    pub fn has_result(&self) -> bool {
        self.state.lock().pushed
    }

    /// 기록된 결과 텍스트
    pub fn result_text(&self) -> Option<String> {
        self.state.lock().result.clone()
    }

    fn push(&self, result: ToolResponse, is_error: bool) -> bool {
        let mut state = self.state.lock();
        if state.pushed {
            tracing::warn!(call_id = %self.call_id, tool = %self.tool_name, "Skipping duplicate tool_result");
            return false;
        }

        let mut content = result.text();
        if content.is_empty() {
            content = response::NO_OUTPUT.to_string();
        }
        let mut images = result.images();

        if let Some(feedback) = &state.approval_feedback {
            content = format!(
                "{}\n\n{}",
                response::tool_approved_with_feedback(&feedback.text),
                content
            );
            images.splice(0..0, feedback.images.iter().cloned());
        }

        let recorded = {
            let mut turn = self.turn.lock();
            let recorded = turn.push_tool_result(&self.call_id, content.clone(), is_error);
            if recorded {
                turn.push_images(images);
            }
            recorded
        };

        state.pushed = true;
        state.result = Some(content);
        recorded
    }
}

impl std::fmt::Debug for ToolCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallbacks")
            .field("call_id", &self.call_id)
            .field("tool_name", &self.tool_name)
            .field("pushed", &self.has_result())
            .finish()
    }
}
