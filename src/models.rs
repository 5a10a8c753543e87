//! L10n Data Models
//!
//! 키/언어 매트릭스와 변경 이력 모델. JSON 응답 형태와 그대로 매핑됩니다.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{L10nError, L10nResult};

/// 일괄 임포트 시 기록되는 변경자
pub const BULK_IMPORT_AUTHOR: &str = "bulk_import";

/// 변경자 헤더가 없을 때 기록되는 기본 변경자
pub const DEFAULT_AUTHOR: &str = "system";

/// 피벗 행에서 언어 코드로 쓸 수 없는 필드 이름
pub const RESERVED_FIELDS: [&str; 2] = ["id", "key"];

/// 언어
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// 초기 언어 시드
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSeed {
    pub code: String,
    pub name: String,
}

impl LanguageSeed {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// 기본 시드 (삽입 순서가 곧 피벗 컬럼 순서)
    pub fn defaults() -> Vec<LanguageSeed> {
        vec![
            LanguageSeed::new("ko", "한국어"),
            LanguageSeed::new("en-US", "미국식 영어"),
            LanguageSeed::new("en-GB", "영국식 영어"),
        ]
    }

    /// `code:name,code:name` 형식 파싱. 이름이 없으면 코드를 이름으로 사용합니다.
    pub fn parse_list(raw: &str) -> Vec<LanguageSeed> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((code, name)) if !name.trim().is_empty() => {
                    LanguageSeed::new(code.trim(), name.trim())
                }
                Some((code, _)) => LanguageSeed::new(code.trim(), code.trim()),
                None => LanguageSeed::new(entry, entry),
            })
            .filter(|seed| !seed.code.is_empty())
            .collect()
    }
}

/// 번역 키
#[derive(Debug, Clone, Serialize)]
pub struct TranslationKey {
    pub id: i64,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 변경 이력 한 건 (언어 이름 포함)
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub translation_id: i64,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub language: String,
    pub language_code: String,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
}

/// 피벗 행: 키 하나에 언어별 텍스트 컬럼
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationRow {
    pub id: i64,
    pub key: String,
    #[serde(flatten)]
    pub texts: BTreeMap<String, Option<String>>,
}

impl TranslationRow {
    pub fn text(&self, code: &str) -> Option<&str> {
        self.texts.get(code).and_then(|t| t.as_deref())
    }
}

/// 목록/검색 결과
#[derive(Debug, Clone, Serialize)]
pub struct TranslationTable {
    pub data: Vec<TranslationRow>,
    pub languages: Vec<String>,
}

/// 내보내기 형태: 언어 코드 -> (키 -> 텍스트)
pub type ExportDump = BTreeMap<String, BTreeMap<String, String>>;

/// 필드 이름 -> 원본 JSON 값 (요청 본문/임포트 항목에서 `key`를 뺀 나머지)
///
/// 어떤 필드가 언어 컬럼인지는 저장소의 언어 목록을 봐야 알 수 있으므로,
/// 값 검증은 [`language_text`]로 언어가 확인된 필드에만 적용합니다.
pub type TextFields = BTreeMap<String, Value>;

/// 임포트 항목 한 개
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub key: String,
    pub texts: TextFields,
}

/// 임포트 파일 파싱 결과
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub items: Vec<ImportItem>,
    /// 키가 없거나 비어 있어 건너뛴 항목 수
    pub skipped_items: usize,
}

/// 임포트 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub items: usize,
    pub keys_created: usize,
    pub texts_written: usize,
    pub skipped_items: usize,
    pub skipped_fields: usize,
}

/// 언어 필드 값을 텍스트로 변환. `null`은 빈 문자열로 취급합니다.
pub fn language_text(code: &str, value: &Value) -> L10nResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(L10nError::Validation(format!(
            "Invalid value for '{}': expected a string, got {}",
            code, other
        ))),
    }
}

/// JSON 객체에서 `key`를 제외한 필드 추출
pub fn text_fields(object: &serde_json::Map<String, Value>) -> TextFields {
    object
        .iter()
        .filter(|(field, _)| field.as_str() != "key")
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

/// 임포트 파일(JSON 배열) 파싱 및 형태 검증
///
/// 배열/객체 형태가 아니면 저장소를 건드리기 전에 거부합니다.
/// 언어 필드 값의 타입은 임포트 트랜잭션 안에서 검사됩니다.
pub fn parse_import(content: &str) -> L10nResult<ImportBatch> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(entries) = value else {
        return Err(L10nError::Validation(
            "Invalid JSON format. Expected an array of translation objects.".to_string(),
        ));
    };

    let mut batch = ImportBatch::default();
    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(object) = entry else {
            return Err(L10nError::Validation(format!(
                "Invalid JSON format. Item {} is not an object.",
                index
            )));
        };

        let key = match object.get("key") {
            Some(Value::String(key)) if !key.is_empty() => key.clone(),
            _ => {
                batch.skipped_items += 1;
                continue;
            }
        };

        batch.items.push(ImportItem {
            key,
            texts: text_fields(object),
        });
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_rejects_non_array() {
        let err = parse_import(r#"{"key":"greeting"}"#).unwrap_err();
        assert!(matches!(err, L10nError::Validation(_)));
    }

    #[test]
    fn test_parse_import_skips_items_without_key() {
        let batch = parse_import(
            r#"[{"key":"greeting","en-US":"Hello","ko":null},{"en-US":"orphan"},{"key":""}]"#,
        )
        .unwrap();

        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.skipped_items, 2);
        assert_eq!(batch.items[0].texts.get("en-US"), Some(&Value::from("Hello")));
        assert_eq!(batch.items[0].texts.get("ko"), Some(&Value::Null));
        assert!(!batch.items[0].texts.contains_key("key"));
    }

    #[test]
    fn test_parse_import_keeps_non_text_fields() {
        let batch = parse_import(r#"[{"key":"greeting","en-US":"Hello","id":3}]"#).unwrap();
        assert_eq!(batch.items[0].texts.get("id"), Some(&Value::from(3)));
    }

    #[test]
    fn test_language_text() {
        assert_eq!(language_text("ko", &Value::from("안녕")).unwrap(), "안녕");
        assert_eq!(language_text("ko", &Value::Null).unwrap(), "");
        let err = language_text("en-US", &Value::from(3)).unwrap_err();
        assert!(matches!(err, L10nError::Validation(_)));
    }

    #[test]
    fn test_language_seed_list() {
        let seeds = LanguageSeed::parse_list(" ja:日本語, fr ,de:, ");
        assert_eq!(
            seeds,
            vec![
                LanguageSeed::new("ja", "日本語"),
                LanguageSeed::new("fr", "fr"),
                LanguageSeed::new("de", "de"),
            ]
        );
    }

    #[test]
    fn test_row_flattens_language_columns() {
        let mut texts = BTreeMap::new();
        texts.insert("en-US".to_string(), Some("Hello".to_string()));
        texts.insert("ko".to_string(), None);
        let row = TranslationRow {
            id: 1,
            key: "greeting".to_string(),
            texts,
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["key"], "greeting");
        assert_eq!(json["en-US"], "Hello");
        assert!(json["ko"].is_null());
    }
}
