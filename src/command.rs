//! flac のコマンドライン組み立て
//!
//! すべての呼び出しはここで組み立てたコマンドラインを `sh -c` で実行する。
//!
//! ```text
//! <exe> <selector> <general…> <format…> <function…> -- '<file>' … 2>&1
//! ```
//!
//! ファイルパスは常にシングルクォートで囲み、バイト列のまま渡す
//! （UTF-8 でないファイル名もそのまま flac に届く）。実行ファイルとオプション
//! 文字列は呼び出し側が書いたまま並べるので、値に空白やクォートを含める場合の
//! エスケープは呼び出し側の責任となる。実行ファイルに `nice -n 10 /usr/bin/flac`
//! のようなコマンド前置きを書くこともできる。

use crate::types::InvocationRequest;
use std::ffi::{OsStr, OsString};

/// オプションと対象ファイルの区切り
pub const END_OF_OPTIONS: &str = "--";

/// 標準エラー出力を標準出力へ結合するリダイレクト
pub const MERGE_STDERR: &str = "2>&1";

/// リクエストと対象ファイルからコマンドラインを組み立てる
///
/// # Examples
///
/// ```
/// # use flac_invoker::command::build_command_line;
/// # use flac_invoker::types::{FlacFunction, InvocationRequest};
/// let request = InvocationRequest::new(FlacFunction::Test);
/// let line = build_command_line("/usr/bin/flac", &request, &["-"]);
/// assert_eq!(line, "/usr/bin/flac -t -- '-' 2>&1");
/// ```
pub fn build_command_line<E, S>(
    executable: E,
    request: &InvocationRequest,
    files: &[S],
) -> OsString
where
    E: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    let mut line = executable.as_ref().to_os_string();
    line.push(" ");

    if let Some(selector) = request.function.selector() {
        line.push(selector);
        line.push(" ");
    }

    for group in [&request.general, &request.format, &request.function_options] {
        if !group.is_empty() {
            line.push(group.join(" "));
            line.push(" ");
        }
    }

    line.push(END_OF_OPTIONS);
    for file in files {
        line.push(" ");
        line.push(quote(file.as_ref()));
    }

    line.push(" ");
    line.push(MERGE_STDERR);
    line
}

/// `--version` 問い合わせ用のコマンドライン
pub fn version_command_line<E: AsRef<OsStr>>(executable: E) -> OsString {
    let mut line = executable.as_ref().to_os_string();
    line.push(" --version ");
    line.push(MERGE_STDERR);
    line
}

/// シェル用にシングルクォートで囲む
///
/// 中のシングルクォートは `'\''` に置き換える。バイト単位で処理するので
/// UTF-8 でない値も変化しない。
#[cfg(unix)]
pub fn quote(value: &OsStr) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let bytes = value.as_bytes();
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'\'');
    for &b in bytes {
        if b == b'\'' {
            quoted.extend_from_slice(b"'\\''");
        } else {
            quoted.push(b);
        }
    }
    quoted.push(b'\'');
    OsString::from_vec(quoted)
}

#[cfg(not(unix))]
pub fn quote(value: &OsStr) -> OsString {
    let value = value.to_string_lossy();
    format!("'{}'", value.replace('\'', "'\\''")).into()
}
