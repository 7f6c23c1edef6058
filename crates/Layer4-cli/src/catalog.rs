//! `warden catalog` - 정적 카탈로그 출력

use std::collections::BTreeMap;
use warden_core::tool::descriptor;
use warden_core::{ToolCatalog, ToolName};
use warden_foundation::WardenConfig;

/// 도구별 필수 필드와 별칭 출력
pub fn print(config: &WardenConfig) {
    let catalog = ToolCatalog::from_config(config);
    let aliases = aliases_by_tool(&catalog);

    println!("{:<24} {:<36} {}", "TOOL", "REQUIRED", "ALIASES");
    println!("{}", "-".repeat(80));

    for tool in ToolName::ALL {
        let required = descriptor(tool)
            .map(|d| d.required_fields().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        let tool_aliases = aliases
            .get(tool.as_str())
            .map(|a| a.join(", "))
            .unwrap_or_default();

        println!(
            "{:<24} {:<36} {}",
            tool.as_str(),
            if required.is_empty() { "-" } else { &required },
            tool_aliases
        );
    }
}

/// 정식 이름 -> 별칭 목록 (별칭 체인은 끝까지 해석)
fn aliases_by_tool(catalog: &ToolCatalog) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (alias, _) in catalog.aliases() {
        let canonical = catalog.resolve_alias(alias).to_string();
        map.entry(canonical).or_default().push(alias.to_string());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_grouped_by_canonical_name() {
        let catalog = ToolCatalog::new().with_alias("w", "write_file");
        let map = aliases_by_tool(&catalog);

        let write = map.get("write_to_file").unwrap();
        assert!(write.contains(&"write_file".to_string()));
        assert!(write.contains(&"w".to_string()));
    }
}
