//! Argument value coercions
//!
//! Models frequently send numbers and booleans as strings, and the legacy
//! `read_file` payload is sometimes JSON encoded twice. These helpers
//! normalize such values; anything that cannot be coerced yields `None`.

use serde_json::{Map, Value};

/// 숫자 또는 숫자 문자열 -> 음이 아닌 정수
pub fn coerce_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(integral_f64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

fn integral_f64(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// 불리언 또는 "true"/"false" 문자열 -> bool
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 문자열 필드: 스칼라는 문자열로 변환, 구조체는 거부
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 배열 필드: 배열 또는 JSON 배열 문자열
pub fn coerce_array(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// 줄 범위 하나를 `{start, end}`로 변환
///
/// Accepts `[start, end]`, `{"start": s, "end": e}` and `"start-end"`.
pub fn coerce_line_range(value: &Value) -> Option<Value> {
    let (start, end) = match value {
        Value::Array(pair) if pair.len() == 2 => (coerce_count(&pair[0])?, coerce_count(&pair[1])?),
        Value::Object(obj) => (
            coerce_count(obj.get("start")?)?,
            coerce_count(obj.get("end")?)?,
        ),
        Value::String(s) => {
            let (a, b) = s.split_once('-')?;
            (
                coerce_count(&Value::String(a.to_string()))?,
                coerce_count(&Value::String(b.to_string()))?,
            )
        }
        _ => return None,
    };
    Some(serde_json::json!({ "start": start, "end": end }))
}

/// 레거시 `files` 항목 정규화
///
/// Entries without a usable `path` are dropped; malformed line ranges are
/// skipped individually.
pub fn coerce_file_entries(value: &Value) -> Option<Value> {
    let entries: Vec<Value> = coerce_array(value)?
        .iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            let path = obj.get("path").and_then(coerce_text)?;
            let ranges: Vec<Value> = obj
                .get("line_ranges")
                .and_then(coerce_array)
                .unwrap_or_default()
                .iter()
                .filter_map(coerce_line_range)
                .collect();
            Some(serde_json::json!({ "path": path, "line_ranges": ranges }))
        })
        .collect();
    Some(Value::Array(entries))
}

/// `read_file` 들여쓰기 모드 옵션 정규화
pub fn coerce_indentation(value: &Value) -> Option<Value> {
    let raw = match value {
        Value::Object(obj) => obj.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(obj)) => obj,
            _ => return None,
        },
        _ => return None,
    };

    let mut out = Map::new();
    for key in ["anchor_line", "max_levels", "max_lines"] {
        if let Some(n) = raw.get(key).and_then(coerce_count) {
            out.insert(key.to_string(), Value::from(n));
        }
    }
    for key in ["include_siblings", "include_header"] {
        if let Some(b) = raw.get(key).and_then(coerce_bool) {
            out.insert(key.to_string(), Value::Bool(b));
        }
    }
    Some(Value::Object(out))
}

/// 후속 질문 제안 목록 정규화
pub fn coerce_follow_ups(value: &Value) -> Option<Value> {
    let items: Vec<Value> = coerce_array(value)?
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(serde_json::json!({ "text": text })),
            Value::Object(obj) => {
                let text = obj.get("text").and_then(coerce_text)?;
                let mut out = Map::new();
                out.insert("text".into(), Value::String(text));
                if let Some(mode) = obj.get("mode").and_then(coerce_text) {
                    out.insert("mode".into(), Value::String(mode));
                }
                Some(Value::Object(out))
            }
            _ => None,
        })
        .collect();
    Some(Value::Array(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(&json!(10)), Some(10));
        assert_eq!(coerce_count(&json!("25")), Some(25));
        assert_eq!(coerce_count(&json!(3.0)), Some(3));
        assert_eq!(coerce_count(&json!(" 7 ")), Some(7));
        assert_eq!(coerce_count(&json!(-1)), None);
        assert_eq!(coerce_count(&json!(1.5)), None);
        assert_eq!(coerce_count(&json!("ten")), None);
        assert_eq!(coerce_count(&json!(null)), None);
    }

    #[test]
    fn test_coerce_bool() {
        assert_eq!(coerce_bool(&json!(true)), Some(true));
        assert_eq!(coerce_bool(&json!("TRUE")), Some(true));
        assert_eq!(coerce_bool(&json!(" false ")), Some(false));
        assert_eq!(coerce_bool(&json!("yes")), None);
        assert_eq!(coerce_bool(&json!(1)), None);
    }

    #[test]
    fn test_line_range_formats() {
        let expected = json!({"start": 1, "end": 50});
        assert_eq!(coerce_line_range(&json!([1, 50])), Some(expected.clone()));
        assert_eq!(coerce_line_range(&json!({"start": 1, "end": 50})), Some(expected.clone()));
        assert_eq!(coerce_line_range(&json!("1-50")), Some(expected));
        assert_eq!(coerce_line_range(&json!("1-")), None);
        assert_eq!(coerce_line_range(&json!([1])), None);
    }

    #[test]
    fn test_file_entries_double_encoded() {
        let raw = json!("[{\"path\":\"a.rs\",\"line_ranges\":[\"1-5\",[10,12]]},{\"nopath\":1}]");
        let entries = coerce_file_entries(&raw).unwrap();
        assert_eq!(
            entries,
            json!([{"path": "a.rs", "line_ranges": [{"start":1,"end":5},{"start":10,"end":12}]}])
        );
    }

    #[test]
    fn test_indentation() {
        let raw = json!({"anchor_line": "12", "include_header": "true", "junk": 1});
        assert_eq!(
            coerce_indentation(&raw),
            Some(json!({"anchor_line": 12, "include_header": true}))
        );
        assert_eq!(coerce_indentation(&json!(5)), None);
    }

    #[test]
    fn test_follow_ups() {
        let raw = json!([{"text": "Yes", "mode": "code"}, "No", 3]);
        assert_eq!(
            coerce_follow_ups(&raw),
            Some(json!([{"text": "Yes", "mode": "code"}, {"text": "No"}]))
        );
    }
}
