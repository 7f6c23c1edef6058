//! Tool Catalog - 정적 도구 이름과 별칭 관리
//!
//! 모델이 보내는 별칭(`write_file` 등)을 정식 이름으로 변환합니다.

use super::names::ToolName;
use std::collections::BTreeMap;
use warden_foundation::WardenConfig;

/// 기본 별칭 (alias -> canonical)
const DEFAULT_ALIASES: &[(&str, ToolName)] = &[
    ("write_file", ToolName::WriteToFile),
    ("create_file", ToolName::WriteToFile),
    ("run_command", ToolName::ExecuteCommand),
];

/// 별칭 체인 최대 깊이
const MAX_ALIAS_DEPTH: usize = 8;

/// 정적 도구 카탈로그
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    aliases: BTreeMap<String, String>,
}

impl ToolCatalog {
    /// 기본 별칭을 포함한 카탈로그 생성
    pub fn new() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(alias, tool)| (alias.to_string(), tool.as_str().to_string()))
            .collect();
        Self { aliases }
    }

    /// 설정의 추가 별칭 적용
    pub fn from_config(config: &WardenConfig) -> Self {
        config
            .tool_aliases
            .iter()
            .fold(Self::new(), |catalog, (alias, canonical)| {
                catalog.with_alias(alias.clone(), canonical.clone())
            })
    }

    /// 별칭 추가
    ///
    /// Canonical catalog names cannot be shadowed by an alias.
    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        let alias = alias.into();
        let canonical = canonical.into();
        if ToolName::parse(&alias).is_some() {
            tracing::warn!(alias = %alias, "Ignoring alias that shadows a catalog tool");
            return self;
        }
        if alias == canonical {
            return self;
        }
        self.aliases.insert(alias, canonical);
        self
    }

    /// 별칭을 정식 이름으로 변환 (별칭이 아니면 그대로)
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.aliases.get(current) {
                Some(next) => current = next.as_str(),
                None => return current,
            }
        }
        tracing::warn!(name = %name, "Alias chain too deep, using last resolved name");
        current
    }

    /// 이름(또는 별칭)으로 카탈로그 도구 조회
    pub fn lookup(&self, name: &str) -> Option<ToolName> {
        ToolName::parse(self.resolve_alias(name))
    }

    /// 모든 별칭
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aliases() {
        let catalog = ToolCatalog::new();
        assert_eq!(catalog.resolve_alias("write_file"), "write_to_file");
        assert_eq!(catalog.lookup("write_file"), Some(ToolName::WriteToFile));
        assert_eq!(catalog.lookup("read_file"), Some(ToolName::ReadFile));
        assert_eq!(catalog.lookup("unknown"), None);
    }

    #[test]
    fn test_alias_resolution_is_idempotent() {
        let catalog = ToolCatalog::new()
            .with_alias("w", "write_file")
            .with_alias("loop_a", "loop_b")
            .with_alias("loop_b", "loop_a");

        for name in ["w", "write_file", "write_to_file", "unknown", "loop_a"] {
            let once = catalog.resolve_alias(name);
            if name == "loop_a" {
                // 순환 별칭은 깊이 제한으로 종료만 보장
                continue;
            }
            assert_eq!(catalog.resolve_alias(once), once, "not idempotent for {name}");
        }
        assert_eq!(catalog.lookup("w"), Some(ToolName::WriteToFile));
    }

    #[test]
    fn test_alias_cannot_shadow_catalog_name() {
        let catalog = ToolCatalog::new().with_alias("read_file", "write_to_file");
        assert_eq!(catalog.lookup("read_file"), Some(ToolName::ReadFile));
    }

    #[test]
    fn test_from_config() {
        let config = WardenConfig::new().with_alias("bash", "execute_command");
        let catalog = ToolCatalog::from_config(&config);
        assert_eq!(catalog.lookup("bash"), Some(ToolName::ExecuteCommand));
        assert!(catalog.aliases().any(|(a, _)| a == "create_file"));
    }
}
