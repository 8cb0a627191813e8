use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// `file` コマンドが使う magic データベースのデフォルトパス
pub const DEFAULT_MAGIC_DB: &str = "/usr/share/misc/magic";

/// MIME タイプ判定の共通トレイト
///
/// バッチ処理で対象ファイルを選別するために使う。
pub trait MimeDetector {
    /// ファイルの MIME タイプを返す。判定できなければ `None`
    fn detect(&self, path: &Path) -> Option<String>;
}

/// 外部の `file` コマンドで判定する
///
/// ファイル1つにつき1回プロセスを起動する:
/// `file -b --mime-type -m <magic_db> <path>`
#[derive(Debug, Clone)]
pub struct FileCommandDetector {
    command: String,
    magic_db: PathBuf,
}

impl FileCommandDetector {
    pub fn new<P: Into<PathBuf>>(command: &str, magic_db: P) -> Self {
        Self {
            command: command.to_string(),
            magic_db: magic_db.into(),
        }
    }
}

impl Default for FileCommandDetector {
    fn default() -> Self {
        Self::new("file", DEFAULT_MAGIC_DB)
    }
}

impl MimeDetector for FileCommandDetector {
    fn detect(&self, path: &Path) -> Option<String> {
        let output = Command::new(&self.command)
            .arg("-b")
            .arg("--mime-type")
            .arg("-m")
            .arg(&self.magic_db)
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let mime_type = String::from_utf8_lossy(&output.stdout).trim().to_string();
                log::debug!("MIMEタイプ判定: {:?} → {}", path, mime_type);
                Some(mime_type)
            }
            Ok(output) => {
                log::debug!(
                    "{} が失敗しました ({:?}): {:?}",
                    self.command,
                    output.status.code(),
                    path
                );
                None
            }
            Err(e) => {
                log::warn!("{} を起動できません: {}", self.command, e);
                None
            }
        }
    }
}

/// 先頭バイトから判定する（プロセスを起動しない）
///
/// 対象の音声コンテナだけを見分け、それ以外の通常ファイルは
/// `application/octet-stream` とする。
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

const SNIFF_LEN: usize = 12;

impl MagicSniffer {
    /// 先頭バイト列から MIME タイプを判定
    pub fn classify(header: &[u8]) -> &'static str {
        if header.starts_with(b"fLaC") {
            return "audio/flac";
        }
        if header.starts_with(b"OggS") {
            return "audio/ogg";
        }
        if header.len() >= 12 {
            let (chunk_id, form_type) = (&header[0..4], &header[8..12]);
            if chunk_id == b"RIFF" && form_type == b"WAVE" {
                return "audio/x-wav";
            }
            if chunk_id == b"FORM" && (form_type == b"AIFF" || form_type == b"AIFC") {
                return "audio/x-aiff";
            }
        }
        "application/octet-stream"
    }
}

impl MimeDetector for MagicSniffer {
    fn detect(&self, path: &Path) -> Option<String> {
        if path.is_dir() {
            return Some("inode/directory".to_string());
        }

        let mut file = File::open(path).ok()?;
        let mut header = Vec::with_capacity(SNIFF_LEN);
        file.by_ref()
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut header)
            .ok()?;

        let mime_type = Self::classify(&header);
        log::debug!("MIMEタイプ判定: {:?} → {}", path, mime_type);
        Some(mime_type.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_classify_headers() {
        assert_eq!(MagicSniffer::classify(b"fLaC\0\0\0\x22"), "audio/flac");
        assert_eq!(MagicSniffer::classify(b"OggS\0\x02"), "audio/ogg");
        assert_eq!(MagicSniffer::classify(b"RIFF\x24\0\0\0WAVE"), "audio/x-wav");
        assert_eq!(MagicSniffer::classify(b"FORM\0\0\0\0AIFF"), "audio/x-aiff");
        assert_eq!(MagicSniffer::classify(b"FORM\0\0\0\0AIFC"), "audio/x-aiff");
        // RIFF でも WAVE でなければ対象外（AVI など）
        assert_eq!(
            MagicSniffer::classify(b"RIFF\0\0\0\0AVI "),
            "application/octet-stream"
        );
        assert_eq!(MagicSniffer::classify(b"ID3"), "application/octet-stream");
        assert_eq!(MagicSniffer::classify(b""), "application/octet-stream");
    }

    #[test]
    fn test_sniff_wav_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..1600 {
            writer
                .write_sample(((i as f32 * 0.1).sin() * 10000.0) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(
            MagicSniffer.detect(&path).as_deref(),
            Some("audio/x-wav")
        );
    }

    #[test]
    fn test_sniff_text_and_directory() {
        let text = write_temp(b"just some notes\n");
        assert_eq!(
            MagicSniffer.detect(text.path()).as_deref(),
            Some("application/octet-stream")
        );

        let temp_dir = TempDir::new().unwrap();
        assert_eq!(
            MagicSniffer.detect(temp_dir.path()).as_deref(),
            Some("inode/directory")
        );
    }

    #[test]
    fn test_sniff_missing_file() {
        assert_eq!(MagicSniffer.detect(Path::new("/nonexistent/file.flac")), None);
    }

    #[test]
    fn test_file_command_missing_binary() {
        let detector = FileCommandDetector::new("/nonexistent/bin/file", DEFAULT_MAGIC_DB);
        let text = write_temp(b"hello");
        assert_eq!(detector.detect(text.path()), None);
    }
}
