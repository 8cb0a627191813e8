//! flac-invoker - flac コマンドの呼び出しを管理するライブラリ
//!
//! 外部の `flac` コマンドを同期的にサブプロセスとして実行し、
//! 出力と終了コードを取り込む。音声処理そのものは行わない。
//!
//! # 主な機能
//!
//! - **単一ファイル処理**: 解析 (`-a`)・デコード (`-d`)・エンコード・検証 (`-t`)
//! - **バッチ処理**: ディレクトリまたはファイルリストから音声ファイルを選別し、1回の呼び出しでまとめて処理
//! - **MIMEタイプ判定**: `file` コマンド、または先頭バイトによる判定
//! - **エラー蓄積**: 例外を投げず、セッションにエラーを記録
//!
//! # アーキテクチャ
//!
//! ```text
//! [FlacInvoker] → [InvocationRequest] → [build_command_line] → [sh -c] → [flac]
//!       │                                        ↑
//!       └── batch → [discover] → [MimeDetector] ─┘
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use flac_invoker::invoker::FlacInvoker;
//! use flac_invoker::types::BatchTarget;
//!
//! let mut flac = FlacInvoker::stdin();
//! let lines = flac.batch_test(&BatchTarget::directory("/music/album"), &["-s"]);
//! println!("{}", lines.join("\n"));
//! if let Some(messages) = flac.error_messages() {
//!     eprintln!("{:?}", messages);
//! }
//! ```

pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod invoker;
pub mod mime;
pub mod process;
pub mod types;

pub use error::InvokeError;
pub use invoker::FlacInvoker;
