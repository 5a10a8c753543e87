//! Pivot Query Builder
//!
//! 좁은 (키, 언어, 텍스트) 행을 키당 한 행, 언어당 한 컬럼으로 펼치는 쿼리를 만듭니다.
//! 언어 집합은 런타임 데이터이므로 호출할 때마다 다시 생성합니다.

use std::collections::BTreeMap;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use crate::models::{Language, TranslationRow};

/// 피벗 대상 필터
#[derive(Debug, Clone, Copy)]
pub enum PivotFilter<'a> {
    All,
    /// 키에 부분 문자열이 포함된 행만 (대소문자 무시)
    KeyContains(&'a str),
    /// 특정 번역 키 한 행
    Id(i64),
}

impl<'a> PivotFilter<'a> {
    /// 빈 검색어는 필터 없음으로 취급
    pub fn search(term: Option<&'a str>) -> Self {
        match term {
            Some(t) if !t.is_empty() => PivotFilter::KeyContains(t),
            _ => PivotFilter::All,
        }
    }
}

/// 생성된 SQL과 바인딩 파라미터
#[derive(Debug)]
pub struct PivotQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// 키 검색에 쓰는 SQL 스칼라 함수 이름
///
/// SQLite의 `LIKE`/`lower()`는 ASCII만 대소문자를 접으므로 Rust의 유니코드 소문자 변환을 씁니다.
pub const FOLD_CASE_FN: &str = "fold_case";

/// 연결에 `fold_case(text)` 등록
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// LIKE 패턴 이스케이프: `%`, `_`, `\`를 리터럴로 취급
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// 언어별 조건부 집계(`MAX(CASE WHEN ...)`)로 피벗 쿼리 생성
///
/// 언어 id는 파라미터로 바인딩되며, 결과 컬럼은 위치로 읽습니다
/// (0: id, 1: key, 2..: `languages` 순서).
pub fn build(languages: &[Language], filter: PivotFilter<'_>) -> PivotQuery {
    let mut params: Vec<Value> = Vec::with_capacity(languages.len() + 1);
    let mut columns = vec!["t.id".to_string(), "t.key".to_string()];

    for lang in languages {
        params.push(Value::Integer(lang.id));
        columns.push(format!(
            "MAX(CASE WHEN tc.language_id = ?{} THEN tc.text END)",
            params.len()
        ));
    }

    let mut sql = format!(
        "SELECT {}
         FROM translations t
         LEFT JOIN text_contents tc ON tc.translation_id = t.id",
        columns.join(", ")
    );

    match filter {
        PivotFilter::All => {}
        PivotFilter::KeyContains(term) => {
            params.push(Value::Text(like_pattern(&term.to_lowercase())));
            sql.push_str(&format!(
                " WHERE {}(t.key) LIKE ?{} ESCAPE '\\'",
                FOLD_CASE_FN,
                params.len()
            ));
        }
        PivotFilter::Id(id) => {
            params.push(Value::Integer(id));
            sql.push_str(&format!(" WHERE t.id = ?{}", params.len()));
        }
    }

    sql.push_str(" GROUP BY t.id ORDER BY t.key");

    PivotQuery { sql, params }
}

/// 피벗 결과 한 행을 모델로 변환
pub fn read_row(row: &Row<'_>, languages: &[Language]) -> rusqlite::Result<TranslationRow> {
    let mut texts = BTreeMap::new();
    for (i, lang) in languages.iter().enumerate() {
        texts.insert(lang.code.clone(), row.get::<_, Option<String>>(i + 2)?);
    }

    Ok(TranslationRow {
        id: row.get(0)?,
        key: row.get(1)?,
        texts,
    })
}
