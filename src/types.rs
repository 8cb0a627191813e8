use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// 標準入力から読み込むことを示すファイル名
pub const STDIN_SENTINEL: &str = "-";

/// flac 実行ファイルのデフォルトパス
pub const DEFAULT_FLAC_EXECUTABLE: &str = "/usr/bin/flac";

/// バッチ処理の対象として受け付ける MIME タイプ
///
/// `file --mime-type` の出力と完全一致で比較する。
pub const ALLOWED_MIME_TYPES: [&str; 8] = [
    "audio/aiff",
    "audio/flac",
    "audio/ogg",
    "audio/ogg;codec=flac",
    "audio/wav",
    "audio/x-aiff",
    "audio/x-flac",
    "audio/x-wav",
];

/// MIME タイプが許可リストに含まれるか
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

/// flac に実行させる機能
///
/// # Examples
///
/// ```
/// # use flac_invoker::types::FlacFunction;
/// assert_eq!(FlacFunction::Test.selector(), Some("-t"));
/// assert_eq!(FlacFunction::Encode.selector(), None); // エンコードはデフォルト動作
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlacFunction {
    /// 解析 (`-a`)
    Analyze,
    /// デコード (`-d`)
    Decode,
    /// エンコード（セレクタなし）
    Encode,
    /// 検証 (`-t`)
    Test,
}

impl FlacFunction {
    /// コマンドラインに置くセレクタトークン
    pub fn selector(self) -> Option<&'static str> {
        match self {
            FlacFunction::Analyze => Some("-a"),
            FlacFunction::Decode => Some("-d"),
            FlacFunction::Encode => None,
            FlacFunction::Test => Some("-t"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FlacFunction::Analyze => "analyze",
            FlacFunction::Decode => "decode",
            FlacFunction::Encode => "encode",
            FlacFunction::Test => "test",
        }
    }
}

impl fmt::Display for FlacFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 1回の flac 呼び出しの内容
///
/// オプションは解釈せず、そのままコマンドラインに並べる。
/// 並び順は general → format → function で固定。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRequest {
    pub function: FlacFunction,
    /// 全機能共通のオプション（`-s`, `-f` など）
    pub general: Vec<String>,
    /// 入出力フォーマットのオプション（`--endian` など）
    pub format: Vec<String>,
    /// 機能固有のオプション（`--residual-text`, `-8` など）
    pub function_options: Vec<String>,
}

impl InvocationRequest {
    pub fn new(function: FlacFunction) -> Self {
        Self {
            function,
            general: Vec::new(),
            format: Vec::new(),
            function_options: Vec::new(),
        }
    }

    pub fn general(mut self, options: &[&str]) -> Self {
        self.general = to_owned_options(options);
        self
    }

    pub fn format(mut self, options: &[&str]) -> Self {
        self.format = to_owned_options(options);
        self
    }

    pub fn function_options(mut self, options: &[&str]) -> Self {
        self.function_options = to_owned_options(options);
        self
    }
}

fn to_owned_options(options: &[&str]) -> Vec<String> {
    options.iter().map(|s| s.to_string()).collect()
}

/// バッチ処理の対象
///
/// ディレクトリを指定した場合は中身を走査し、
/// ファイルリストを指定した場合はその順に処理する。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchTarget {
    Directory(PathBuf),
    Files(Vec<PathBuf>),
}

impl BatchTarget {
    pub fn directory<P: Into<PathBuf>>(path: P) -> Self {
        BatchTarget::Directory(path.into())
    }

    pub fn files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        BatchTarget::Files(paths.into_iter().map(Into::into).collect())
    }
}

/// 1回の呼び出し結果
///
/// 標準出力と標準エラー出力を結合した行と終了コード。
/// シグナルで終了した場合や起動できなかった場合、終了コードは `None`。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub lines: Vec<String>,
    pub exit_code: Option<i32>,
}

impl InvocationResult {
    /// 終了コード 0 のときのみ成功
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors() {
        assert_eq!(FlacFunction::Analyze.selector(), Some("-a"));
        assert_eq!(FlacFunction::Decode.selector(), Some("-d"));
        assert_eq!(FlacFunction::Encode.selector(), None);
        assert_eq!(FlacFunction::Test.selector(), Some("-t"));
    }

    #[test]
    fn test_allow_list() {
        assert_eq!(ALLOWED_MIME_TYPES.len(), 8);
        assert!(is_allowed_mime_type("audio/x-flac"));
        assert!(is_allowed_mime_type("audio/ogg;codec=flac"));
        assert!(!is_allowed_mime_type("audio/mpeg"));
        assert!(!is_allowed_mime_type("text/plain"));
        // 前後の空白は呼び出し側で除去済みの前提
        assert!(!is_allowed_mime_type(" audio/flac"));
    }

    #[test]
    fn test_request_builder() {
        let request = InvocationRequest::new(FlacFunction::Decode)
            .general(&["-s"])
            .format(&["--endian=little"])
            .function_options(&["--apply-replaygain-which-is-not-lossless"]);

        assert_eq!(request.function, FlacFunction::Decode);
        assert_eq!(request.general, vec!["-s"]);
        assert_eq!(request.format, vec!["--endian=little"]);
        assert_eq!(request.function_options.len(), 1);
    }

    #[test]
    fn test_result_success() {
        let ok = InvocationResult {
            lines: vec![],
            exit_code: Some(0),
        };
        assert!(ok.success());

        let failed = InvocationResult {
            lines: vec!["ERROR".to_string()],
            exit_code: Some(1),
        };
        assert!(!failed.success());

        // シグナル終了
        assert!(!InvocationResult::default().success());
    }
}
