use crate::error::InvokeError;
use crate::mime::MimeDetector;
use crate::types::{is_allowed_mime_type, BatchTarget};
use std::fs;
use std::path::{Path, PathBuf};

/// バッチ対象の探索結果
///
/// 許可リストに一致したファイルと、探索中に記録したエラー。
/// エラーがあっても見つかったファイルは処理対象に残る。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub errors: Vec<InvokeError>,
}

/// バッチ対象から処理するファイルを集める
///
/// 判定できなかったファイルと許可リスト外のファイルは黙って除外する。
pub fn discover(target: &BatchTarget, detector: &dyn MimeDetector) -> Discovery {
    match target {
        BatchTarget::Directory(dir) => discover_directory(dir, detector),
        BatchTarget::Files(files) => discover_files(files, detector),
    }
}

fn discover_directory(dir: &Path, detector: &dyn MimeDetector) -> Discovery {
    let mut discovery = Discovery::default();
    let path = dir.to_string_lossy().into_owned();

    if !dir.is_dir() {
        discovery.errors.push(InvokeError::NotADirectory { path });
        return discovery;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("ディレクトリの読み込みに失敗: {:?}: {}", dir, e);
            discovery.errors.push(InvokeError::DirectoryNotReadable { path });
            return discovery;
        }
    };

    // read_dir は "." と ".." を返さない。順序は名前順に揃える
    let mut names: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect();
    names.sort();

    for name in names {
        let candidate = dir.join(name);
        if accepts(&candidate, detector) {
            discovery.files.push(candidate);
        }
    }

    discovery
}

fn discover_files(files: &[PathBuf], detector: &dyn MimeDetector) -> Discovery {
    let mut discovery = Discovery::default();

    for file in files {
        if !file.is_file() {
            discovery.errors.push(InvokeError::InvalidFilename {
                path: file.to_string_lossy().into_owned(),
            });
            continue;
        }
        if accepts(file, detector) {
            discovery.files.push(file.clone());
        }
    }

    discovery
}

fn accepts(path: &Path, detector: &dyn MimeDetector) -> bool {
    match detector.detect(path) {
        Some(mime_type) if is_allowed_mime_type(&mime_type) => true,
        Some(mime_type) => {
            log::debug!("対象外のためスキップ: {:?} ({})", path, mime_type);
            false
        }
        None => {
            log::debug!("MIMEタイプを判定できないためスキップ: {:?}", path);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::MagicSniffer;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// 拡張子から MIME タイプを返し、問い合わせを記録する検出器
    struct ExtensionDetector {
        queried: RefCell<Vec<PathBuf>>,
    }

    impl ExtensionDetector {
        fn new() -> Self {
            Self {
                queried: RefCell::new(Vec::new()),
            }
        }
    }

    impl MimeDetector for ExtensionDetector {
        fn detect(&self, path: &Path) -> Option<String> {
            self.queried.borrow_mut().push(path.to_path_buf());
            let mime_type = match path.extension()?.to_str()? {
                "flac" => "audio/x-flac",
                "wav" => "audio/x-wav",
                "oga" => "audio/ogg;codec=flac",
                "aiff" => "audio/aiff",
                "mp3" => "audio/mpeg",
                _ => "text/plain",
            };
            Some(mime_type.to_string())
        }
    }

    fn touch(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_directory_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(dir, "c.wav", b"");
        touch(dir, "a.flac", b"");
        touch(dir, "notes.txt", b"");
        touch(dir, "b.mp3", b"");
        touch(dir, "d.oga", b"");
        fs::create_dir(dir.join("sub")).unwrap();

        let detector = ExtensionDetector::new();
        let discovery = discover(&BatchTarget::directory(dir), &detector);

        assert!(discovery.errors.is_empty());
        assert_eq!(
            discovery.files,
            vec![dir.join("a.flac"), dir.join("c.wav"), dir.join("d.oga")]
        );

        // "." と ".." 以外はすべて判定にかける
        let queried = detector.queried.borrow();
        assert_eq!(queried.len(), 6);
        assert!(queried.iter().all(|p| {
            let name = p.file_name().unwrap();
            name != "." && name != ".."
        }));
    }

    #[test]
    fn test_directory_with_real_headers() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(dir, "01.flac", b"fLaC\0\0\0\x22");
        touch(dir, "02.ogg", b"OggS\0\x02\0\0");
        touch(dir, "03.mp3", b"ID3\x04\0\0\0\0\0\0");
        touch(dir, "04.aif", b"FORM\0\0\0\x2eAIFF");
        // 拡張子ではなく中身で判定される
        touch(dir, "05.flac", b"not really flac");

        let discovery = discover(&BatchTarget::directory(dir), &MagicSniffer);

        assert_eq!(
            discovery.files,
            vec![dir.join("01.flac"), dir.join("02.ogg"), dir.join("04.aif")]
        );
    }

    #[test]
    fn test_missing_directory() {
        let detector = ExtensionDetector::new();
        let discovery = discover(
            &BatchTarget::directory("/nonexistent/music/dir"),
            &detector,
        );

        assert!(discovery.files.is_empty());
        assert_eq!(
            discovery.errors,
            vec![InvokeError::NotADirectory {
                path: "/nonexistent/music/dir".to_string()
            }]
        );
        assert!(detector.queried.borrow().is_empty());
    }

    #[test]
    fn test_file_path_is_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = touch(temp_dir.path(), "a.flac", b"");

        let discovery = discover(&BatchTarget::directory(&file), &ExtensionDetector::new());
        assert!(matches!(
            discovery.errors.as_slice(),
            [InvokeError::NotADirectory { .. }]
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        touch(&locked, "a.flac", b"");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root は権限に関係なく読めるので確認できない
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let detector = ExtensionDetector::new();
        let discovery = discover(&BatchTarget::directory(&locked), &detector);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(discovery.files.is_empty());
        assert_eq!(
            discovery.errors,
            vec![InvokeError::DirectoryNotReadable {
                path: locked.to_string_lossy().into_owned()
            }]
        );
        assert!(detector.queried.borrow().is_empty());
    }

    #[test]
    fn test_file_list_keeps_order_and_skips_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let second = touch(dir, "z.flac", b"");
        let first = touch(dir, "a.wav", b"");
        let missing = dir.join("missing.flac");

        let detector = ExtensionDetector::new();
        let discovery = discover(
            &BatchTarget::files(vec![second.clone(), missing.clone(), first.clone()]),
            &detector,
        );

        // 無効なパスがあっても残りは処理を続ける
        assert_eq!(discovery.files, vec![second, first]);
        assert_eq!(
            discovery.errors,
            vec![InvokeError::InvalidFilename {
                path: missing.to_string_lossy().into_owned()
            }]
        );
        assert_eq!(detector.queried.borrow().len(), 2);
    }

    #[test]
    fn test_file_list_rejects_directories() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("album");
        fs::create_dir(&sub).unwrap();

        let discovery = discover(&BatchTarget::files(vec![sub]), &ExtensionDetector::new());
        assert!(discovery.files.is_empty());
        assert_eq!(discovery.errors.len(), 1);
    }

    #[test]
    fn test_file_list_skips_disallowed_silently() {
        let temp_dir = TempDir::new().unwrap();
        let mp3 = touch(temp_dir.path(), "track.mp3", b"");

        let discovery = discover(&BatchTarget::files(vec![mp3]), &ExtensionDetector::new());
        assert!(discovery.files.is_empty());
        assert!(discovery.errors.is_empty());
    }
}
