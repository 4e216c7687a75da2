use std::io;
use std::path::Path;

/// Writes data atomically by using a temporary sibling file followed by rename.
/// 以臨時檔案搭配 rename 實現原子寫入。
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".part");
    let tmp_path = Path::new(&tmp_name);
    tokio::fs::write(tmp_path, data).await?;
    tokio::fs::rename(tmp_path, path).await?;
    Ok(())
}

/// Reduces an uploaded object name to a bare file name, refusing anything that
/// would escape the session folder.
pub(crate) fn safe_file_name(name: &str) -> Option<&str> {
    let candidate = name.rsplit(['/', '\\']).next()?.trim();
    if candidate.is_empty() || candidate == "." || candidate == ".." {
        return None;
    }
    Some(candidate)
}

/// Partial downloads and dotfiles never appear in listings.
pub(crate) fn is_listable(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with(".part")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_from_object_names() {
        assert_eq!(safe_file_name("session/cat.png"), Some("cat.png"));
        assert_eq!(safe_file_name("..\\..\\boot.ini"), Some("boot.ini"));
        assert_eq!(safe_file_name("a/.."), None);
        assert_eq!(safe_file_name("dir/"), None);
    }

    #[test]
    fn hides_partial_and_hidden_files() {
        assert!(is_listable("cat.png"));
        assert!(!is_listable("cat.png.part"));
        assert!(!is_listable(".DS_Store"));
    }

    #[tokio::test]
    async fn write_atomic_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a/b/file.bin");
        write_atomic(&target, b"data").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"data");
        assert!(!tmp.path().join("a/b/file.bin.part").exists());
    }
}
