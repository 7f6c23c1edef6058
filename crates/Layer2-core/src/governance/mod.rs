//! Governance collaborator surface
//!
//! Hooks consult governance through the [`Governance`] trait: which scope is
//! active, what a scope owns, whether a command is destructive, and the
//! read-hash ledger used for optimistic locking. How scopes are authored
//! and stored is up to the implementor.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use warden_foundation::{Error, Result};

/// 읽기 전용으로 간주하는 명령 접두사
const SAFE_COMMAND_PREFIXES: &[&[&str]] = &[
    &["ls"],
    &["dir"],
    &["pwd"],
    &["git", "status"],
    &["git", "log"],
    &["git", "diff"],
    &["cat"],
    &["type"],
    &["git", "branch"],
    &["git", "show"],
    &["find"],
    &["grep"],
];

/// 명령 연결/리다이렉션 토큰
const SHELL_OPERATORS: &[&str] = &["&&", "||", ";", "|", ">", ">>", "&"];

/// 거버넌스 범위 (intent)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GovernanceScope {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    /// 소유 경로 패턴 (glob 또는 부분 문자열)
    #[serde(default)]
    pub owned_scope: Vec<String>,
}

impl GovernanceScope {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_owned(mut self, pattern: impl Into<String>) -> Self {
        self.owned_scope.push(pattern.into());
        self
    }
}

/// 거버넌스 협력자 인터페이스
pub trait Governance: Send + Sync {
    /// 현재 활성 범위 id
    fn active_scope_id(&self) -> Option<String>;

    /// 범위 조회
    fn scope(&self, id: &str) -> Option<GovernanceScope>;

    /// 정의된 범위가 하나라도 있는지 (거버넌스 활성 여부)
    fn has_scopes(&self) -> bool;

    /// 경로가 범위의 소유 패턴에 포함되는지
    fn is_path_in_scope(&self, scope: &GovernanceScope, path: &str) -> bool {
        path_matches_scope(scope, path)
    }

    /// 명령이 파괴적인지 (안전 접두사 목록에 없으면 파괴적)
    fn is_destructive_command(&self, command: &str) -> bool {
        is_destructive_command(command)
    }

    /// 읽기 시점 파일 해시 기록
    fn record_read_hash(&self, path: &Path, hash: String);

    /// 기록된 읽기 해시
    fn read_hash(&self, path: &Path) -> Option<String>;
}

/// 소유 패턴 매칭 (glob 메타문자가 있으면 glob, 아니면 부분 문자열)
///
/// The path is normalized first; a path whose `..` segments climb above
/// its root never matches.
pub fn path_matches_scope(scope: &GovernanceScope, path: &str) -> bool {
    let Some(path) = normalize_path(path) else {
        tracing::debug!(path = %path, "Path escapes its root");
        return false;
    };
    scope.owned_scope.iter().any(|pattern| {
        if pattern.contains(['*', '?', '[']) {
            match glob::Pattern::new(pattern) {
                Ok(glob) => glob.matches(&path),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "Invalid scope pattern");
                    false
                }
            }
        } else {
            path.contains(pattern.as_str())
        }
    })
}

/// `.`/`..` 를 어휘적으로 해석한 `/` 구분 경로 (루트 밖으로 나가면 `None`)
pub fn normalize_path(path: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    Some(if absolute { format!("/{}", joined) } else { joined })
}

/// 기본 파괴적 명령 휴리스틱
///
/// Commands that fail to tokenize or chain several commands are treated as
/// destructive.
pub fn is_destructive_command(command: &str) -> bool {
    let Some(tokens) = shlex::split(command.trim()) else {
        return true;
    };
    if tokens.is_empty() {
        return false;
    }
    if tokens.iter().any(|t| SHELL_OPERATORS.contains(&t.as_str())) {
        return true;
    }
    if command.contains("$(") || command.contains('`') {
        return true;
    }

    !SAFE_COMMAND_PREFIXES.iter().any(|prefix| {
        prefix.len() <= tokens.len() && prefix.iter().zip(&tokens).all(|(p, t)| p == t)
    })
}

// ============================================================================
// InMemoryGovernance
// ============================================================================

/// 메모리 기반 거버넌스 구현
#[derive(Debug, Default)]
pub struct InMemoryGovernance {
    scopes: RwLock<Vec<GovernanceScope>>,
    active: RwLock<Option<String>>,
    read_hashes: Mutex<HashMap<PathBuf, String>>,
}

impl InMemoryGovernance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(self, scope: GovernanceScope) -> Self {
        self.add_scope(scope);
        self
    }

    /// 범위 추가 (같은 id면 교체)
    pub fn add_scope(&self, scope: GovernanceScope) {
        let mut scopes = self.scopes.write();
        scopes.retain(|s| s.id != scope.id);
        scopes.push(scope);
    }

    /// 활성 범위 선택 (None이면 해제)
    pub fn set_active_scope(&self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            if self.scope(id).is_none() {
                return Err(Error::Governance(format!("unknown scope '{}'", id)));
            }
        }
        tracing::debug!(scope = ?id, "Active governance scope changed");
        *self.active.write() = id.map(str::to_string);
        Ok(())
    }

    pub fn scopes(&self) -> Vec<GovernanceScope> {
        self.scopes.read().clone()
    }
}

impl Governance for InMemoryGovernance {
    fn active_scope_id(&self) -> Option<String> {
        self.active.read().clone()
    }

    fn scope(&self, id: &str) -> Option<GovernanceScope> {
        self.scopes.read().iter().find(|s| s.id == id).cloned()
    }

    fn has_scopes(&self) -> bool {
        !self.scopes.read().is_empty()
    }

    fn record_read_hash(&self, path: &Path, hash: String) {
        self.read_hashes.lock().insert(path.to_path_buf(), hash);
    }

    fn read_hash(&self, path: &Path) -> Option<String> {
        self.read_hashes.lock().get(path).cloned()
    }
}
