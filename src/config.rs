//! Configuration
//!
//! 환경 변수 기반 서버 설정. `.env.local` / `.env` 파일이 있으면 먼저 로드합니다.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{L10nError, L10nResult};
use crate::models::LanguageSeed;

/// 로그 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// 서버 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite 파일 경로
    pub db_path: PathBuf,
    pub bind_host: String,
    pub port: u16,
    /// 업로드 임시 파일 디렉토리
    pub upload_dir: PathBuf,
    /// 정적 UI 디렉토리 (없으면 API만 제공)
    pub static_dir: Option<PathBuf>,
    /// 기본 시드 뒤에 추가되는 언어
    pub extra_languages: Vec<LanguageSeed>,
    /// 비어 있으면 모든 origin 허용
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("database.sqlite"),
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            upload_dir: std::env::temp_dir().join("l10n_uploads"),
            static_dir: None,
            extra_languages: Vec::new(),
            cors_origins: Vec::new(),
            log_format: LogFormat::Pretty,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn find_upwards(start: PathBuf, filename: &str, max_hops: usize) -> Option<PathBuf> {
    let mut cur = start;
    for _ in 0..=max_hops {
        let candidate = cur.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        if !cur.pop() {
            break;
        }
    }
    None
}

/// `.env.local` 우선, 없으면 `.env`. 작업 디렉토리에서 상위로 올라가며 찾습니다.
/// 이미 설정된 환경 변수는 덮어쓰지 않습니다.
pub fn load_env_files() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    for filename in [".env.local", ".env"] {
        if let Some(path) = find_upwards(cwd.clone(), filename, 6) {
            if dotenvy::from_path(&path).is_ok() {
                return Some(path);
            }
        }
    }
    None
}

impl AppConfig {
    /// 환경 변수에서 설정 생성
    ///
    /// - `L10N_DB_PATH`: SQLite 파일 (기본 `database.sqlite`)
    /// - `L10N_BIND`: 바인드 호스트 (기본 `0.0.0.0`)
    /// - `PORT` 또는 `L10N_PORT`: 포트 (기본 3000)
    /// - `L10N_UPLOAD_DIR`: 업로드 임시 디렉토리
    /// - `L10N_STATIC_DIR`: 정적 UI 디렉토리
    /// - `L10N_EXTRA_LANGUAGES`: `code:name,code:name`
    /// - `L10N_CORS_ORIGINS`: 콤마 구분 origin 목록
    /// - `L10N_LOG_FORMAT`: `pretty` | `json`
    /// - `L10N_MAX_UPLOAD_BYTES`: 업로드 최대 크기
    pub fn from_env() -> L10nResult<Self> {
        let defaults = Self::default();

        let port = match env_var("PORT").or_else(|| env_var("L10N_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| L10nError::Validation(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        let log_format = match env_var("L10N_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(L10nError::Validation(format!(
                    "Invalid log format: {} (expected pretty or json)",
                    other
                )))
            }
        };

        let max_upload_bytes = match env_var("L10N_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                L10nError::Validation(format!("Invalid upload size limit: {}", raw))
            })?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            db_path: env_var("L10N_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            bind_host: env_var("L10N_BIND").unwrap_or(defaults.bind_host),
            port,
            upload_dir: env_var("L10N_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            static_dir: env_var("L10N_STATIC_DIR").map(PathBuf::from),
            extra_languages: env_var("L10N_EXTRA_LANGUAGES")
                .map(|raw| LanguageSeed::parse_list(&raw))
                .unwrap_or_default(),
            cors_origins: env_var("L10N_CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_format,
            max_upload_bytes,
        })
    }

    /// 기본 시드 + 추가 언어
    pub fn language_seeds(&self) -> Vec<LanguageSeed> {
        let mut seeds = LanguageSeed::defaults();
        for extra in &self.extra_languages {
            if !seeds.iter().any(|s| s.code == extra.code) {
                seeds.push(extra.clone());
            }
        }
        seeds
    }

    pub fn bind_addr(&self) -> L10nResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| L10nError::Validation(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// 존재하는 정적 디렉토리만 반환
    pub fn existing_static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref().filter(|dir| dir.is_dir())
    }
}
