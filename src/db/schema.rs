//! Database Schema
//!
//! SQLite 테이블 스키마 정의

/// 데이터베이스 스키마 생성 SQL
pub const CREATE_SCHEMA: &str = r#"
-- 언어 테이블 (id 순서가 피벗 컬럼 순서)
CREATE TABLE IF NOT EXISTS languages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

-- 번역 키 테이블
CREATE TABLE IF NOT EXISTS translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- 언어별 현재 텍스트 (키/언어당 한 행)
CREATE TABLE IF NOT EXISTS text_contents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    translation_id INTEGER NOT NULL,
    language_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    FOREIGN KEY (translation_id) REFERENCES translations(id) ON DELETE CASCADE,
    FOREIGN KEY (language_id) REFERENCES languages(id),
    UNIQUE (translation_id, language_id)
);

CREATE INDEX IF NOT EXISTS idx_text_contents_language ON text_contents(language_id);

-- 변경 이력 (추가 전용)
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    translation_id INTEGER NOT NULL,
    language_id INTEGER NOT NULL,
    changed_at INTEGER NOT NULL,
    changed_by TEXT,
    old_text TEXT,
    new_text TEXT,
    FOREIGN KEY (translation_id) REFERENCES translations(id) ON DELETE CASCADE,
    FOREIGN KEY (language_id) REFERENCES languages(id)
);

CREATE INDEX IF NOT EXISTS idx_history_translation ON history(translation_id);
CREATE INDEX IF NOT EXISTS idx_history_changed_at ON history(changed_at);
"#;
