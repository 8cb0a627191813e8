use crate::command::{build_command_line, version_command_line};
use crate::config::{Config, DetectorBackend};
use crate::discovery::discover;
use crate::error::InvokeError;
use crate::mime::{FileCommandDetector, MagicSniffer, MimeDetector};
use crate::process::{run_shell, run_shell_raw};
use crate::types::{
    BatchTarget, FlacFunction, InvocationRequest, InvocationResult, DEFAULT_FLAC_EXECUTABLE,
    STDIN_SENTINEL,
};
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};

/// flac 呼び出しセッション
///
/// 対象の音声ファイル1つと flac 実行ファイルを保持し、
/// 解析・デコード・エンコード・検証を同期的に実行する。
///
/// どの操作もエラーを返さない。失敗はセッションに蓄積され、
/// [`has_errors`](Self::has_errors) と [`errors`](Self::errors) で確認する。
/// 一度記録されたエラーは後続の呼び出しが成功しても消えない。
///
/// # Examples
///
/// ```no_run
/// # use flac_invoker::invoker::FlacInvoker;
/// let mut flac = FlacInvoker::new("song.flac");
/// let lines = flac.test(&["-s"]);
/// if flac.has_errors() {
///     for message in flac.error_messages().unwrap_or_default() {
///         eprintln!("{}", message);
///     }
/// }
/// println!("{}", lines.join("\n"));
/// ```
pub struct FlacInvoker {
    audio_file: PathBuf,
    executable: OsString,
    detector: Box<dyn MimeDetector>,
    command: Option<OsString>,
    output: Vec<String>,
    exit_code: Option<i32>,
    errors: Vec<InvokeError>,
}

impl FlacInvoker {
    /// デフォルトの flac (`/usr/bin/flac`) で新しいセッションを作成
    ///
    /// `"-"` を渡すと標準入力を対象にする。
    pub fn new<P: AsRef<Path>>(audio_file: P) -> Self {
        Self::with_executable(audio_file, DEFAULT_FLAC_EXECUTABLE)
    }

    /// 標準入力を対象にするセッション
    pub fn stdin() -> Self {
        Self::new(STDIN_SENTINEL)
    }

    /// flac 実行ファイルを指定してセッションを作成
    ///
    /// 対象がファイルでない、または読めない場合はエラーを記録するが、
    /// セッション自体は作成される。実行ファイルはコマンドラインにそのまま
    /// 書かれるので、`nice -n 10 /usr/bin/flac` のような前置きも使える。
    pub fn with_executable<P, E>(audio_file: P, executable: E) -> Self
    where
        P: AsRef<Path>,
        E: AsRef<OsStr>,
    {
        let audio_file = audio_file.as_ref();
        let mut invoker = Self {
            audio_file: PathBuf::new(),
            executable: executable.as_ref().to_os_string(),
            detector: Box::new(FileCommandDetector::default()),
            command: None,
            output: Vec::new(),
            exit_code: None,
            errors: Vec::new(),
        };

        if audio_file.as_os_str() == STDIN_SENTINEL {
            invoker.audio_file = PathBuf::from(STDIN_SENTINEL);
        } else if audio_file.is_file() {
            match File::open(audio_file) {
                Ok(_) => invoker.audio_file = audio_file.to_path_buf(),
                Err(e) => {
                    log::debug!("ファイルを開けません: {:?}: {}", audio_file, e);
                    invoker.record(InvokeError::NotReadable {
                        path: audio_file.to_string_lossy().into_owned(),
                    });
                }
            }
        } else {
            invoker.record(InvokeError::NotAFile {
                path: audio_file.to_string_lossy().into_owned(),
            });
        }

        invoker
    }

    /// 設定からセッションを作成
    pub fn from_config<P: AsRef<Path>>(config: &Config, audio_file: P) -> Self {
        let detector: Box<dyn MimeDetector> = match config.detector.backend {
            DetectorBackend::File => Box::new(FileCommandDetector::new(
                &config.detector.file_command,
                &config.detector.magic_db,
            )),
            DetectorBackend::Sniff => Box::new(MagicSniffer),
        };
        Self::with_executable(audio_file, &config.flac.executable).with_detector(detector)
    }

    /// バッチ処理で使う MIME タイプ検出器を差し替える
    pub fn with_detector(mut self, detector: Box<dyn MimeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// 解析 (`-a`)
    pub fn analyze(&mut self, general: &[&str], analysis: &[&str]) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Analyze)
            .general(general)
            .function_options(analysis);
        self.single(&request)
    }

    /// デコード (`-d`)
    pub fn decode(&mut self, general: &[&str], format: &[&str], decoding: &[&str]) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Decode)
            .general(general)
            .format(format)
            .function_options(decoding);
        self.single(&request)
    }

    /// エンコード（セレクタなし）
    pub fn encode(&mut self, general: &[&str], format: &[&str], encoding: &[&str]) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Encode)
            .general(general)
            .format(format)
            .function_options(encoding);
        self.single(&request)
    }

    /// 検証 (`-t`)
    pub fn test(&mut self, general: &[&str]) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Test).general(general);
        self.single(&request)
    }

    pub fn batch_analyze(
        &mut self,
        target: &BatchTarget,
        general: &[&str],
        analysis: &[&str],
    ) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Analyze)
            .general(general)
            .function_options(analysis);
        self.batch(&request, target)
    }

    pub fn batch_decode(
        &mut self,
        target: &BatchTarget,
        general: &[&str],
        format: &[&str],
        decoding: &[&str],
    ) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Decode)
            .general(general)
            .format(format)
            .function_options(decoding);
        self.batch(&request, target)
    }

    pub fn batch_encode(
        &mut self,
        target: &BatchTarget,
        general: &[&str],
        format: &[&str],
        encoding: &[&str],
    ) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Encode)
            .general(general)
            .format(format)
            .function_options(encoding);
        self.batch(&request, target)
    }

    pub fn batch_test(&mut self, target: &BatchTarget, general: &[&str]) -> Vec<String> {
        let request = InvocationRequest::new(FlacFunction::Test).general(general);
        self.batch(&request, target)
    }

    /// セッションの対象ファイルに対してリクエストを実行
    pub fn single(&mut self, request: &InvocationRequest) -> Vec<String> {
        let command = build_command_line(&self.executable, request, &[self.audio_file.as_os_str()]);
        self.execute(request.function, command)
    }

    /// バッチ対象を探索し、一致したファイルをまとめて1回で実行
    ///
    /// 探索中にエラーがあっても、一致したファイルがなくても実行する。
    pub fn batch(&mut self, request: &InvocationRequest, target: &BatchTarget) -> Vec<String> {
        let discovery = discover(target, self.detector.as_ref());
        for error in discovery.errors {
            self.record(error);
        }

        log::debug!("バッチ対象: {} ファイル", discovery.files.len());

        let command = build_command_line(&self.executable, request, &discovery.files);
        self.execute(request.function, command)
    }

    fn execute(&mut self, function: FlacFunction, command: OsString) -> Vec<String> {
        log::debug!("{} を実行: {}", function, command.to_string_lossy());

        match run_shell(&command) {
            Ok(result) => {
                if !result.success() {
                    self.record(InvokeError::UnknownFailure {
                        exit_code: result.exit_code,
                    });
                }
                self.output = result.lines;
                self.exit_code = result.exit_code;
            }
            Err(e) => {
                self.record(InvokeError::Spawn {
                    reason: e.to_string(),
                });
                self.output.clear();
                self.exit_code = None;
            }
        }

        self.command = Some(command);
        self.output.clone()
    }

    fn record(&mut self, error: InvokeError) {
        log::warn!("{} ({:?})", error, error);
        self.errors.push(error);
    }

    /// `--version` の出力をそのまま返す
    ///
    /// セッションの状態（コマンド、出力、エラー）は変更しない。
    pub fn version(&self) -> String {
        let command = version_command_line(&self.executable);
        match run_shell_raw(&command) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("バージョンの取得に失敗: {}", e);
                String::new()
            }
        }
    }

    /// エラーが記録されているか
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 記録されたエラー。一度も記録されていなければ `None`
    pub fn errors(&self) -> Option<&[InvokeError]> {
        if self.has_errors() {
            Some(self.errors.as_slice())
        } else {
            None
        }
    }

    /// 記録されたエラーのメッセージ
    pub fn error_messages(&self) -> Option<Vec<String>> {
        self.errors()
            .map(|errors| errors.iter().map(|e| e.to_string()).collect())
    }

    /// 最後に組み立てたコマンドライン
    ///
    /// ファイルパスのバイト列をそのまま含む。
    pub fn command(&self) -> Option<&OsStr> {
        self.command.as_deref()
    }

    /// 表示用のコマンドライン。UTF-8 でない部分は置換文字になる
    pub fn command_string(&self) -> Option<String> {
        self.command
            .as_ref()
            .map(|c| c.to_string_lossy().into_owned())
    }

    /// 最後の呼び出しで取り込んだ出力
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// 最後の呼び出しの終了コード
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn last_result(&self) -> InvocationResult {
        InvocationResult {
            lines: self.output.clone(),
            exit_code: self.exit_code,
        }
    }

    /// 対象ファイル。検証に失敗した場合は空のパス
    pub fn audio_file(&self) -> &Path {
        &self.audio_file
    }

    pub fn executable(&self) -> &OsStr {
        &self.executable
    }
}

impl Default for FlacInvoker {
    fn default() -> Self {
        Self::stdin()
    }
}
