use serde::Serialize;
use thiserror::Error;

/// セッションに記録されるエラー
///
/// どの操作もエラーを返さず、ここに蓄積していく。
/// メッセージは呼び出し側に表示されることを想定している。
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvokeError {
    #[error("The supplied filename is not a file.")]
    NotAFile { path: String },

    #[error("The file is not readable.")]
    NotReadable { path: String },

    #[error("The given path was not a valid directory.")]
    NotADirectory { path: String },

    #[error("The directory is not readable.")]
    DirectoryNotReadable { path: String },

    #[error("One or more of the given file paths were not valid filenames.")]
    InvalidFilename { path: String },

    /// flac が 0 以外で終了した。原因は区別しない
    #[error("An unknown error occurred.")]
    UnknownFailure { exit_code: Option<i32> },

    #[error("Failed to start the command: {reason}")]
    Spawn { reason: String },
}

impl InvokeError {
    /// 入力検証で発生したエラーか（サブプロセス実行前に記録される）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            InvokeError::NotAFile { .. }
                | InvokeError::NotReadable { .. }
                | InvokeError::NotADirectory { .. }
                | InvokeError::DirectoryNotReadable { .. }
                | InvokeError::InvalidFilename { .. }
        )
    }
}
