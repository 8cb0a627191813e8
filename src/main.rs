use anyhow::{bail, Context, Result};
use env_logger::Env;
use flac_invoker::config::Config;
use flac_invoker::invoker::FlacInvoker;
use flac_invoker::types::{BatchTarget, FlacFunction, InvocationRequest, STDIN_SENTINEL};
use flac_invoker::InvokeError;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "\
使い方:
  flac-invoker --generate-config [path]
  flac-invoker [--config <path>] [--json] version
  flac-invoker [--config <path>] [--json] <analyze|decode|encode|test> [target...]

target を省略すると標準入力を処理する。ディレクトリを1つ指定すると中の音声ファイルを、
複数のパスを指定するとそれらをまとめて処理する。";

/// コマンドライン引数
#[derive(Debug, PartialEq, Eq)]
enum Action {
    GenerateConfig(PathBuf),
    Version,
    Run {
        function: FlacFunction,
        targets: Vec<PathBuf>,
    },
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config_path: PathBuf,
    json: bool,
    action: Action,
}

/// JSON 出力の形式
#[derive(Serialize)]
struct Report<'a> {
    command: Option<String>,
    lines: &'a [String],
    exit_code: Option<i32>,
    errors: Option<&'a [InvokeError]>,
}

const DEFAULT_CONFIG_PATH: &str = "flac-invoker.toml";

/// 引数を解析する
///
/// 対象パスは UTF-8 でなくてもそのまま受け取る。
fn parse_args(args: &[OsString]) -> Result<Args> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut json = false;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.to_str() {
            Some("--config") => {
                config_path = iter
                    .next()
                    .map(PathBuf::from)
                    .context("--config には設定ファイルのパスが必要です")?;
            }
            Some("--json") => json = true,
            Some("--generate-config") => {
                let path = iter
                    .next()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
                return Ok(Args {
                    config_path,
                    json,
                    action: Action::GenerateConfig(path),
                });
            }
            _ => rest.push(arg.clone()),
        }
    }

    let (name, targets) = match rest.split_first() {
        Some(split) => split,
        None => bail!("コマンドを指定してください\n\n{}", USAGE),
    };

    let function = match name.to_string_lossy().as_ref() {
        "version" => {
            return Ok(Args {
                config_path,
                json,
                action: Action::Version,
            })
        }
        "analyze" => FlacFunction::Analyze,
        "decode" => FlacFunction::Decode,
        "encode" => FlacFunction::Encode,
        "test" => FlacFunction::Test,
        other => bail!("不明なコマンドです: {}\n\n{}", other, USAGE),
    };

    Ok(Args {
        config_path,
        json,
        action: Action::Run {
            function,
            targets: targets.iter().map(PathBuf::from).collect(),
        },
    })
}

/// 設定のオプションからリクエストを組み立てる
fn request_from_config(config: &Config, function: FlacFunction) -> InvocationRequest {
    let options = &config.options;
    let (format, function_options) = match function {
        FlacFunction::Analyze => (Vec::new(), options.analysis.clone()),
        FlacFunction::Decode => (options.format.clone(), options.decoding.clone()),
        FlacFunction::Encode => (options.format.clone(), options.encoding.clone()),
        FlacFunction::Test => (Vec::new(), Vec::new()),
    };

    InvocationRequest {
        function,
        general: options.general.clone(),
        format,
        function_options,
    }
}

/// 対象の数と種類から単一処理かバッチ処理かを決める
fn dispatch(
    invoker_for: impl Fn(&Path) -> FlacInvoker,
    request: &InvocationRequest,
    targets: &[PathBuf],
) -> FlacInvoker {
    match targets {
        [] => {
            let mut invoker = invoker_for(Path::new(STDIN_SENTINEL));
            invoker.single(request);
            invoker
        }
        [only] if only.is_dir() => {
            let mut invoker = invoker_for(Path::new(STDIN_SENTINEL));
            invoker.batch(request, &BatchTarget::Directory(only.clone()));
            invoker
        }
        [only] => {
            let mut invoker = invoker_for(only.as_path());
            invoker.single(request);
            invoker
        }
        many => {
            let mut invoker = invoker_for(Path::new(STDIN_SENTINEL));
            invoker.batch(request, &BatchTarget::Files(many.to_vec()));
            invoker
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config_path = args.config_path.as_path();

    let (function, targets) = match args.action {
        Action::GenerateConfig(path) => {
            Config::write_default(&path)?;
            println!("設定ファイルを生成しました: {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Action::Version => {
            let config = Config::load_or_default(config_path)?;
            let invoker = FlacInvoker::from_config(&config, STDIN_SENTINEL);
            print!("{}", invoker.version());
            return Ok(ExitCode::SUCCESS);
        }
        Action::Run { function, targets } => (function, targets),
    };

    let config = Config::load_or_default(config_path)?;
    log::debug!("設定: {:?}", config);

    let request = request_from_config(&config, function);
    let invoker = dispatch(
        |audio_file| FlacInvoker::from_config(&config, audio_file),
        &request,
        &targets,
    );

    if args.json || config.output.json {
        let report = Report {
            command: invoker.command_string(),
            lines: invoker.output(),
            exit_code: invoker.exit_code(),
            errors: invoker.errors(),
        };
        let json = serde_json::to_string_pretty(&report).context("結果のシリアライズに失敗")?;
        println!("{}", json);
    } else {
        for line in invoker.output() {
            println!("{}", line);
        }
    }

    if let Some(messages) = invoker.error_messages() {
        for message in messages {
            log::error!("{}", message);
        }
        return Ok(ExitCode::FAILURE);
    }

    log::info!("{} が完了しました", function);
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    // ロガーを初期化
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let args = parse_args(&args)?;

    run(args)
}
