use std::path::{Path, PathBuf};

use tokio::fs::File;

use crate::error::L10nResult;

/// 업로드 임시 파일. 처리 성공/실패와 관계없이 drop 시 삭제됩니다.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// `dir` 아래에 고유한 이름으로 빈 파일을 만듭니다.
    pub async fn create(dir: &Path) -> L10nResult<(Self, File)> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("import-{}.json", uuid::Uuid::new_v4()));
        let file = File::create(&path).await?;
        Ok((Self { path }, file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "temp upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp upload")
            }
        }
    }
}
