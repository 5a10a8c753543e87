//! L10n Editor - 다국어 번역 문자열 관리 서버
//!
//! 키/언어 매트릭스를 SQLite에 정규화해 저장하고, 모든 텍스트 변경을 이력으로 남깁니다.
//! 검색, 일괄 임포트/내보내기, 변경 이력 조회를 REST API로 제공합니다.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod telemetry;
pub mod utils;

use crate::config::AppConfig;
use crate::db::Database;
use crate::error::{L10nError, L10nResult};
use crate::routes::{create_router, AppState};

/// 설정에 따라 데이터베이스를 열고 스키마/언어 시드를 적용
pub fn open_database(config: &AppConfig) -> L10nResult<Database> {
    let db = Database::new(&config.db_path)?;
    db.initialize(&config.language_seeds())?;
    tracing::info!(path = %config.db_path.display(), "database ready");
    Ok(db)
}

/// 서버 실행 (Ctrl+C로 종료)
pub async fn run() -> L10nResult<()> {
    let env_file = config::load_env_files();
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(config.log_format);
    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let db = open_database(&config)?;
    std::fs::create_dir_all(&config.upload_dir)?;

    let state = AppState::new(db, config.upload_dir.clone());
    let app = create_router(state, &config);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server is running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(L10nError::from)?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
