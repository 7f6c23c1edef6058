//! 턴 단위 상태
//!
//! Everything the presentation loop accumulates while one assistant
//! message is processed: the pending user content, the rejection and
//! consumption flags, and per-tool usage counters.

use crate::content::{sanitize_tool_use_id, UserContent};
use std::collections::{BTreeMap, HashSet};

/// 도구별 사용 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolUsage {
    pub attempts: u32,
    pub failures: u32,
}

/// 한 턴의 상태
#[derive(Debug, Default)]
pub struct TurnState {
    user_content: Vec<UserContent>,
    result_ids: HashSet<String>,
    /// 사용자가 이번 턴에 도구를 거부함
    pub did_reject_tool: bool,
    /// 이번 턴에 도구가 스트림을 소비함
    pub did_already_use_tool: bool,
    /// 이번 턴에 체크포인트를 저장함
    pub did_checkpoint: bool,
    /// 연속 실수 횟수 (턴을 넘어 유지)
    pub consecutive_mistakes: u32,
    usage: BTreeMap<String, ToolUsage>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 턴 시작 (실수 횟수와 사용 통계는 유지)
    pub fn begin_turn(&mut self) {
        self.user_content.clear();
        self.result_ids.clear();
        self.did_reject_tool = false;
        self.did_already_use_tool = false;
        self.did_checkpoint = false;
    }

    /// 도구 결과 추가
    ///
    /// A second result for the same call id is dropped with a warning.
    /// Returns whether the result was recorded.
    pub fn push_tool_result(&mut self, call_id: &str, content: impl Into<String>, is_error: bool) -> bool {
        let tool_use_id = sanitize_tool_use_id(call_id);
        if !self.result_ids.insert(tool_use_id.clone()) {
            tracing::warn!(call_id = %call_id, "Skipping duplicate tool_result");
            return false;
        }
        self.user_content.push(UserContent::ToolResult {
            tool_use_id,
            content: content.into(),
            is_error,
        });
        true
    }

    pub fn has_result(&self, call_id: &str) -> bool {
        self.result_ids.contains(&sanitize_tool_use_id(call_id))
    }

    pub fn push_content(&mut self, content: UserContent) {
        self.user_content.push(content);
    }

    pub fn push_images(&mut self, images: impl IntoIterator<Item = String>) {
        self.user_content
            .extend(images.into_iter().map(|source| UserContent::Image { source }));
    }

    pub fn user_content(&self) -> &[UserContent] {
        &self.user_content
    }

    pub fn take_user_content(&mut self) -> Vec<UserContent> {
        std::mem::take(&mut self.user_content)
    }

    pub fn record_mistake(&mut self) {
        self.consecutive_mistakes += 1;
    }

    pub fn reset_mistakes(&mut self) {
        self.consecutive_mistakes = 0;
    }

    pub fn record_usage(&mut self, tool: &str) {
        self.usage.entry(tool.to_string()).or_default().attempts += 1;
    }

    pub fn record_failure(&mut self, tool: &str, message: &str) {
        tracing::debug!(tool = %tool, error = %message, "Tool error recorded");
        self.usage.entry(tool.to_string()).or_default().failures += 1;
    }

    pub fn usage(&self, tool: &str) -> ToolUsage {
        self.usage.get(tool).copied().unwrap_or_default()
    }

    pub fn usage_summary(&self) -> &BTreeMap<String, ToolUsage> {
        &self.usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_results_dropped() {
        let mut turn = TurnState::new();
        assert!(turn.push_tool_result("c1", "first", false));
        assert!(!turn.push_tool_result("c1", "second", true));
        assert_eq!(turn.user_content().len(), 1);
        assert!(matches!(
            &turn.user_content()[0],
            UserContent::ToolResult { content, is_error: false, .. } if content == "first"
        ));
    }

    #[test]
    fn test_sanitized_ids_collide() {
        let mut turn = TurnState::new();
        assert!(turn.push_tool_result("a.b", "x", false));
        assert!(turn.has_result("a_b"));
        assert!(!turn.push_tool_result("a_b", "y", false));
    }

    #[test]
    fn test_begin_turn_keeps_mistakes() {
        let mut turn = TurnState::new();
        turn.record_mistake();
        turn.did_reject_tool = true;
        turn.push_tool_result("c1", "x", false);
        turn.record_usage("read_file");

        turn.begin_turn();
        assert!(!turn.did_reject_tool);
        assert!(turn.user_content().is_empty());
        assert!(!turn.has_result("c1"));
        assert_eq!(turn.consecutive_mistakes, 1);
        assert_eq!(turn.usage("read_file").attempts, 1);
    }
}
