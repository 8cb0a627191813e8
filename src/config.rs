use crate::mime::DEFAULT_MAGIC_DB;
use crate::types::DEFAULT_FLAC_EXECUTABLE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub flac: FlacConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// flac 実行ファイル設定
///
/// `executable` はクォートせずコマンドラインの先頭に置くので、
/// `"nice -n 10 /usr/bin/flac"` のような前置きも書ける。
///
/// # デフォルト値
///
/// - `executable`: "/usr/bin/flac"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlacConfig {
    #[serde(default = "default_executable")]
    pub executable: String,
}

/// MIME タイプ検出器の種類
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    /// 外部の `file` コマンド（ファイル毎にプロセスを起動）
    File,
    /// 先頭バイトによる判定（プロセス起動なし）
    Sniff,
}

/// バッチ処理のファイル判定設定
///
/// # デフォルト値
///
/// - `backend`: "file"
/// - `file_command`: "file"
/// - `magic_db`: "/usr/share/misc/magic"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    #[serde(default = "default_backend")]
    pub backend: DetectorBackend,
    #[serde(default = "default_file_command")]
    pub file_command: String,
    #[serde(default = "default_magic_db")]
    pub magic_db: String,
}

/// flac に渡すオプション
///
/// 値は解釈せずそのままコマンドラインに並べる。空白を含む値のクォートは
/// ここに書く側で行う。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OptionsConfig {
    /// 全機能共通
    #[serde(default)]
    pub general: Vec<String>,
    /// デコード・エンコード時のフォーマット
    #[serde(default)]
    pub format: Vec<String>,
    #[serde(default)]
    pub analysis: Vec<String>,
    #[serde(default)]
    pub decoding: Vec<String>,
    #[serde(default)]
    pub encoding: Vec<String>,
}

/// 出力設定
///
/// # デフォルト値
///
/// - `json`: false (取り込んだ行をそのまま表示)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: bool,
}

// Default functions
fn default_executable() -> String {
    DEFAULT_FLAC_EXECUTABLE.to_string()
}

fn default_backend() -> DetectorBackend {
    DetectorBackend::File
}

fn default_file_command() -> String {
    "file".to_string()
}

fn default_magic_db() -> String {
    DEFAULT_MAGIC_DB.to_string()
}

impl Default for FlacConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            file_command: default_file_command(),
            magic_db: default_magic_db(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use flac_invoker::config::Config;
    /// let config = Config::from_file("flac-invoker.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// 既存のファイルは上書きされる。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}
