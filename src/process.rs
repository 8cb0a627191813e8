use crate::types::InvocationResult;
use std::ffi::OsStr;
use std::io;
use std::process::{Command, Output, Stdio};

/// コマンドラインを `sh -c` で同期実行する
///
/// flac の標準エラー出力はコマンドライン側の `2>&1` で標準出力に結合される。
/// シェル自身のエラー（クォートの閉じ忘れによる構文エラーなど）は
/// リダイレクトが効く前に出るため、標準エラー出力の行を末尾に追加する。
/// 標準入力は親プロセスから引き継ぐ（`-` で標準入力を読むため）。
/// 行末の空白は取り除く。
///
/// # Errors
///
/// シェルを起動できなかった場合にエラーを返す。
/// 終了コードが 0 以外でもエラーにはならない。
pub fn run_shell(command_line: &OsStr) -> io::Result<InvocationResult> {
    let output = shell(command_line, Stdio::inherit())?;

    let mut lines = Vec::new();
    for stream in [&output.stdout, &output.stderr] {
        let text = String::from_utf8_lossy(stream);
        lines.extend(text.lines().map(|l| l.trim_end().to_string()));
    }

    Ok(InvocationResult {
        lines,
        exit_code: output.status.code(),
    })
}

/// 出力をそのまま文字列で返す
///
/// `--version` のように解釈しない出力向け。
pub fn run_shell_raw(command_line: &OsStr) -> io::Result<String> {
    let output = shell(command_line, Stdio::null())?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text)
}

fn shell(command_line: &OsStr, stdin: Stdio) -> io::Result<Output> {
    Command::new("sh")
        .arg("-c")
        .arg(command_line)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
}
