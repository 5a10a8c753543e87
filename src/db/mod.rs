//! Database Module
//!
//! SQLite 기반 키/언어 텍스트 저장소와 변경 이력 관리

mod pivot;
mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};

use crate::error::{L10nError, L10nResult};
use crate::models::{
    language_text, ExportDump, HistoryEntry, ImportBatch, ImportSummary, Language, LanguageSeed,
    TextFields, TranslationKey, TranslationRow, TranslationTable, BULK_IMPORT_AUTHOR,
    RESERVED_FIELDS,
};

use pivot::PivotFilter;

/// 다른 연결이 쓰기 잠금을 잡고 있을 때 기다리는 최대 시간
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// 데이터베이스 상태 (라우터 상태로 주입)
pub struct DbState(pub Mutex<Database>);

impl DbState {
    pub fn new(db: Database) -> Self {
        Self(Mutex::new(db))
    }
}

/// 데이터베이스 래퍼
pub struct Database {
    conn: Connection,
}

/// 텍스트 한 건을 덮어쓴 결과
struct RecordedChange {
    history_id: i64,
    old_text: Option<String>,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn load_languages(conn: &Connection) -> rusqlite::Result<Vec<Language>> {
    let mut stmt = conn.prepare("SELECT id, code, name FROM languages ORDER BY id")?;
    let iter = stmt.query_map([], |row| {
        Ok(Language {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
        })
    })?;

    let mut languages = Vec::new();
    for lang in iter {
        languages.push(lang?);
    }
    Ok(languages)
}

fn translation_exists(conn: &Connection, translation_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM translations WHERE id = ?1)",
        [translation_id],
        |row| row.get(0),
    )
}

/// 키 조회, 없으면 생성. (id, 새로 생성 여부) 반환
fn resolve_key(conn: &Connection, key: &str, now: i64) -> rusqlite::Result<(i64, bool)> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO translations (key, created_at, updated_at) VALUES (?1, ?2, ?2)",
        params![key, now],
    )?;
    let id = conn.query_row("SELECT id FROM translations WHERE key = ?1", [key], |row| {
        row.get(0)
    })?;
    Ok((id, inserted == 1))
}

fn touch(conn: &Connection, translation_id: i64, now: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE translations SET updated_at = ?1 WHERE id = ?2",
        params![now, translation_id],
    )?;
    Ok(())
}

/// 이전 값을 읽고, 텍스트를 덮어쓰고, 이력을 남깁니다.
///
/// 호출자가 연 쓰기 트랜잭션 안에서만 호출해야 합니다.
fn upsert_text(
    conn: &Connection,
    translation_id: i64,
    language_id: i64,
    text: &str,
    changed_by: &str,
    now: i64,
) -> rusqlite::Result<RecordedChange> {
    let old_text: Option<String> = conn
        .query_row(
            "SELECT text FROM text_contents WHERE translation_id = ?1 AND language_id = ?2",
            params![translation_id, language_id],
            |row| row.get(0),
        )
        .optional()?;

    conn.execute(
        "INSERT INTO text_contents (translation_id, language_id, text)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(translation_id, language_id) DO UPDATE SET text = excluded.text",
        params![translation_id, language_id, text],
    )?;

    conn.execute(
        "INSERT INTO history (translation_id, language_id, changed_at, changed_by, old_text, new_text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![translation_id, language_id, now, changed_by, old_text, text],
    )?;

    Ok(RecordedChange {
        history_id: conn.last_insert_rowid(),
        old_text,
    })
}

impl Database {
    /// 새 데이터베이스 연결 생성
    pub fn new(path: &Path) -> L10nResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::configure(Connection::open(path)?)
    }

    /// 메모리 데이터베이스 (테스트/임시용)
    pub fn open_in_memory() -> L10nResult<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> L10nResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        pivot::register_functions(&conn)?;
        Ok(Self { conn })
    }

    /// 스키마 생성 및 언어 시드 적용
    pub fn initialize(&self, seeds: &[LanguageSeed]) -> L10nResult<()> {
        self.conn.execute_batch(schema::CREATE_SCHEMA)?;
        for seed in seeds {
            self.ensure_language(&seed.code, &seed.name)?;
        }
        Ok(())
    }

    /// 언어가 없으면 추가 (이미 있으면 기존 행 반환)
    pub fn ensure_language(&self, code: &str, name: &str) -> L10nResult<Language> {
        let code = code.trim();
        if code.is_empty() {
            return Err(L10nError::Validation("Language code is required".to_string()));
        }
        if RESERVED_FIELDS.contains(&code) {
            return Err(L10nError::Validation(format!(
                "Language code '{}' is reserved",
                code
            )));
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO languages (code, name) VALUES (?1, ?2)",
            params![code, name],
        )?;
        if inserted == 1 {
            tracing::info!(code, name, "language added");
        }

        let lang = self.conn.query_row(
            "SELECT id, code, name FROM languages WHERE code = ?1",
            [code],
            |row| {
                Ok(Language {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )?;
        Ok(lang)
    }

    /// 언어 목록 (id 순)
    pub fn languages(&self) -> L10nResult<Vec<Language>> {
        Ok(load_languages(&self.conn)?)
    }

    fn query_pivot(
        &self,
        languages: &[Language],
        filter: PivotFilter<'_>,
    ) -> L10nResult<Vec<TranslationRow>> {
        let query = pivot::build(languages, filter);
        let mut stmt = self.conn.prepare(&query.sql)?;
        let iter = stmt.query_map(params_from_iter(query.params.iter()), |row| {
            pivot::read_row(row, languages)
        })?;

        let mut rows = Vec::new();
        for row in iter {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// 피벗 목록 조회. `search`가 있으면 키 부분 일치(대소문자 무시)로 필터링
    pub fn list_translations(&self, search: Option<&str>) -> L10nResult<TranslationTable> {
        let languages = self.languages()?;
        let data = self.query_pivot(&languages, PivotFilter::search(search))?;
        tracing::debug!(
            rows = data.len(),
            search = search.unwrap_or(""),
            "listed translations"
        );

        Ok(TranslationTable {
            data,
            languages: languages.into_iter().map(|l| l.code).collect(),
        })
    }

    /// 번역 키 한 개의 피벗 행
    pub fn get_translation_row(&self, translation_id: i64) -> L10nResult<TranslationRow> {
        let languages = self.languages()?;
        self.query_pivot(&languages, PivotFilter::Id(translation_id))?
            .into_iter()
            .next()
            .ok_or(L10nError::TranslationNotFound(translation_id))
    }

    /// 번역 키 메타데이터 조회
    pub fn find_translation(&self, translation_id: i64) -> L10nResult<TranslationKey> {
        self.conn
            .query_row(
                "SELECT id, key, created_at, updated_at FROM translations WHERE id = ?1",
                [translation_id],
                |row| {
                    Ok(TranslationKey {
                        id: row.get(0)?,
                        key: row.get(1)?,
                        created_at: from_millis(row.get(2)?),
                        updated_at: from_millis(row.get(3)?),
                    })
                },
            )
            .optional()?
            .ok_or(L10nError::TranslationNotFound(translation_id))
    }

    /// 새 키 생성. 모든 언어에 텍스트(없으면 빈 문자열)와 첫 이력을 남깁니다.
    pub fn create_translation(
        &mut self,
        key: &str,
        texts: &TextFields,
        changed_by: &str,
    ) -> L10nResult<TranslationRow> {
        if key.is_empty() {
            return Err(L10nError::Validation("Key is required".to_string()));
        }

        let now = now_millis();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM translations WHERE key = ?1)",
            [key],
            |row| row.get(0),
        )?;
        if exists {
            return Err(L10nError::KeyAlreadyExists(key.to_string()));
        }

        let (translation_id, _) = resolve_key(&tx, key, now)?;
        let languages = load_languages(&tx)?;
        for lang in &languages {
            let text = match texts.get(&lang.code) {
                Some(value) => language_text(&lang.code, value)?,
                None => String::new(),
            };
            upsert_text(&tx, translation_id, lang.id, &text, changed_by, now)?;
        }
        tx.commit()?;

        tracing::info!(translation_id, key, changed_by, "translation created");
        self.get_translation_row(translation_id)
    }

    /// 기존 키의 언어별 텍스트 수정. 알 수 없는 언어 필드는 무시합니다.
    pub fn update_translation(
        &mut self,
        translation_id: i64,
        texts: &TextFields,
        changed_by: &str,
    ) -> L10nResult<TranslationRow> {
        let now = now_millis();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !translation_exists(&tx, translation_id)? {
            return Err(L10nError::TranslationNotFound(translation_id));
        }
        touch(&tx, translation_id, now)?;

        let mut written = 0usize;
        for lang in load_languages(&tx)? {
            if let Some(value) = texts.get(&lang.code) {
                let text = language_text(&lang.code, value)?;
                upsert_text(&tx, translation_id, lang.id, &text, changed_by, now)?;
                written += 1;
            }
        }
        tx.commit()?;

        tracing::info!(translation_id, written, changed_by, "translation updated");
        self.get_translation_row(translation_id)
    }

    /// 키/언어 한 칸에 텍스트 기록 (키가 없으면 생성)
    ///
    /// 이전 값 조회, 덮어쓰기, 이력 추가가 하나의 IMMEDIATE 트랜잭션에서 수행되므로
    /// 동시에 쓰는 다른 연결이 있어도 `old_text`가 어긋나지 않습니다.
    pub fn write_text(
        &mut self,
        key: &str,
        language_code: &str,
        text: &str,
        changed_by: &str,
    ) -> L10nResult<HistoryEntry> {
        if key.is_empty() {
            return Err(L10nError::Validation("Key is required".to_string()));
        }

        let now = now_millis();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let language = load_languages(&tx)?
            .into_iter()
            .find(|l| l.code == language_code)
            .ok_or_else(|| L10nError::LanguageNotFound(language_code.to_string()))?;

        let (translation_id, _) = resolve_key(&tx, key, now)?;
        touch(&tx, translation_id, now)?;
        let change = upsert_text(&tx, translation_id, language.id, text, changed_by, now)?;
        tx.commit()?;

        Ok(HistoryEntry {
            id: change.history_id,
            translation_id,
            changed_at: from_millis(now),
            changed_by: Some(changed_by.to_string()),
            language: language.name,
            language_code: language.code,
            old_text: change.old_text,
            new_text: Some(text.to_string()),
        })
    }

    /// 전체 텍스트 내보내기 (언어 -> 키 -> 텍스트)
    pub fn export_translations(&self) -> L10nResult<ExportDump> {
        let mut stmt = self.conn.prepare(
            "SELECT l.code, t.key, tc.text
             FROM text_contents tc
             JOIN translations t ON t.id = tc.translation_id
             JOIN languages l ON l.id = tc.language_id
             ORDER BY l.code, t.key",
        )?;
        let iter = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut dump = ExportDump::new();
        for row in iter {
            let (code, key, text) = row?;
            dump.entry(code).or_default().insert(key, text);
        }
        Ok(dump)
    }

    /// 일괄 임포트 (전부 성공하거나 전부 롤백)
    ///
    /// 알 수 없는 언어 코드(`id` 같은 부가 컬럼 포함)는 값 타입과 관계없이 건너뜁니다.
    /// 언어 필드 값이 문자열/null이 아니면 검증 오류로 전체를 롤백합니다.
    pub fn import_translations(&mut self, batch: &ImportBatch) -> L10nResult<ImportSummary> {
        let now = now_millis();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let languages: HashMap<String, i64> = load_languages(&tx)?
            .into_iter()
            .map(|l| (l.code, l.id))
            .collect();

        let mut summary = ImportSummary {
            items: batch.items.len(),
            skipped_items: batch.skipped_items,
            ..ImportSummary::default()
        };

        for item in &batch.items {
            let fail = |source: rusqlite::Error| L10nError::ImportFailed {
                key: item.key.clone(),
                source,
            };

            let (translation_id, created) = resolve_key(&tx, &item.key, now).map_err(fail)?;
            if created {
                summary.keys_created += 1;
            }
            touch(&tx, translation_id, now).map_err(fail)?;

            for (code, value) in &item.texts {
                let Some(&language_id) = languages.get(code) else {
                    summary.skipped_fields += 1;
                    continue;
                };
                let text = language_text(code, value)?;
                upsert_text(&tx, translation_id, language_id, &text, BULK_IMPORT_AUTHOR, now)
                    .map_err(fail)?;
                summary.texts_written += 1;
            }
        }

        tx.commit()?;
        tracing::info!(
            items = summary.items,
            keys_created = summary.keys_created,
            texts_written = summary.texts_written,
            skipped_fields = summary.skipped_fields,
            "bulk import committed"
        );
        Ok(summary)
    }

    /// 키 하나의 변경 이력 (최신순)
    pub fn history(&self, translation_id: i64) -> L10nResult<Vec<HistoryEntry>> {
        if !translation_exists(&self.conn, translation_id)? {
            return Err(L10nError::TranslationNotFound(translation_id));
        }

        let mut stmt = self.conn.prepare(
            "SELECT h.id, h.translation_id, h.changed_at, h.changed_by, l.name, l.code,
                    h.old_text, h.new_text
             FROM history h
             JOIN languages l ON h.language_id = l.id
             WHERE h.translation_id = ?1
             ORDER BY h.changed_at DESC, h.id DESC",
        )?;
        let iter = stmt.query_map([translation_id], |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                translation_id: row.get(1)?,
                changed_at: from_millis(row.get(2)?),
                changed_by: row.get(3)?,
                language: row.get(4)?,
                language_code: row.get(5)?,
                old_text: row.get(6)?,
                new_text: row.get(7)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in iter {
            entries.push(entry?);
        }
        Ok(entries)
    }
}
