//! Custom Tool Registry - 동적으로 등록되는 도구
//!
//! 카탈로그에 없는 도구를 런타임에 등록합니다. 커스텀 도구는 임의의
//! 파라미터 키를 허용하며 인자를 그대로 전달받습니다.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use warden_foundation::{Error, Result};

/// 커스텀 도구 실행 컨텍스트
#[derive(Debug, Clone)]
pub struct CustomToolContext {
    pub task_id: String,
    pub call_id: String,
    pub cwd: PathBuf,
}

/// 커스텀 도구 트레이트
#[async_trait]
pub trait CustomTool: Send + Sync {
    /// 도구 이름 (카탈로그 이름과 겹치지 않아야 함)
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// JSON Schema 형식의 파라미터 정의
    fn parameters(&self) -> Option<Value> {
        None
    }

    /// 인자 검증
    ///
    /// The default checks the schema's `required` list, if any.
    fn validate(&self, args: &Value) -> Result<()> {
        let Some(schema) = self.parameters() else {
            return Ok(());
        };
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for field in required.iter().filter_map(Value::as_str) {
            if args.get(field).map_or(true, Value::is_null) {
                return Err(Error::invalid_arguments(
                    self.name(),
                    format!("missing required parameter '{}'", field),
                ));
            }
        }
        Ok(())
    }

    /// 도구 실행
    async fn execute(&self, args: Value, ctx: &CustomToolContext) -> Result<String>;
}

/// 커스텀 도구 레지스트리
#[derive(Default)]
pub struct CustomToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn CustomTool>>>,
}

impl CustomToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 도구 등록 (같은 이름이면 교체)
    pub fn register(&self, tool: Arc<dyn CustomTool>) {
        let name = tool.name().to_string();
        if self.tools.write().insert(name.clone(), tool).is_some() {
            tracing::debug!(tool = %name, "Replaced custom tool");
        }
    }

    /// 도구 제거
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn CustomTool>> {
        self.tools.write().remove(name)
    }

    /// 도구 조회
    pub fn get(&self, name: &str) -> Option<Arc<dyn CustomTool>> {
        self.tools.read().get(name).cloned()
    }

    /// 도구 존재 여부
    pub fn has(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// 모든 도구 이름 (정렬)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }
}

impl std::fmt::Debug for CustomToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
