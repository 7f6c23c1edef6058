//! 연속 동일 도구 호출 감지

use crate::interaction::AskKind;
use serde::Serialize;
use warden_core::{DisplayParams, ToolUse};

/// 사용자에게 보낼 질문
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepetitionPrompt {
    pub kind: AskKind,
    pub message: String,
}

/// 반복 검사 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepetitionCheck {
    pub allow_execution: bool,
    pub ask_user: Option<RepetitionPrompt>,
}

impl RepetitionCheck {
    fn allowed() -> Self {
        Self {
            allow_execution: true,
            ask_user: None,
        }
    }
}

#[derive(Serialize)]
struct Signature<'a> {
    name: &'a str,
    params: &'a DisplayParams,
}

/// 연속 동일 호출 감지기
///
/// The first occurrence of a signature starts the count at zero; each
/// identical follow-up increments it. Reaching the limit blocks the call
/// and resets the detector. A limit of 0 disables detection.
#[derive(Debug, Clone)]
pub struct ToolRepetitionDetector {
    limit: u32,
    previous: Option<String>,
    count: u32,
}

impl ToolRepetitionDetector {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            previous: None,
            count: 0,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 완료된 호출 검사
    pub fn check(&mut self, call: &ToolUse) -> RepetitionCheck {
        let signature = signature(call);

        if self.previous.as_deref() == Some(signature.as_str()) {
            self.count += 1;
        } else {
            self.count = 0;
            self.previous = Some(signature);
        }

        if self.limit > 0 && self.count >= self.limit {
            tracing::warn!(tool = %call.name, limit = self.limit, "Tool repetition limit reached");
            self.reset();
            return RepetitionCheck {
                allow_execution: false,
                ask_user: Some(RepetitionPrompt {
                    kind: AskKind::MistakeLimitReached,
                    message: format!(
                        "The agent appears to be stuck in a loop, attempting the same action ({}) repeatedly. \
                         Consider rephrasing the task or guiding it towards a different approach.",
                        call.name
                    ),
                }),
            };
        }

        RepetitionCheck::allowed()
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.count = 0;
    }
}

impl Default for ToolRepetitionDetector {
    fn default() -> Self {
        Self::new(warden_foundation::DEFAULT_REPETITION_LIMIT)
    }
}

fn signature(call: &ToolUse) -> String {
    let sig = Signature {
        name: call.name.as_str(),
        params: &call.params,
    };
    serde_json::to_string(&sig).unwrap_or_else(|_| call.name.as_str().to_string())
}
