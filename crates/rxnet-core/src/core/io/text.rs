//! Text-file helpers for the external tool's output trees.
//!
//! Output files may contain stray non-UTF-8 bytes (the tool echoes raw node
//! banners), so reads are lossy by construction.

use std::fs;
use std::io;
use std::path::Path;

/// Reads a file as lossy UTF-8. Returns `None` when the file does not exist;
/// read failures on an existing file are logged and also yield `None` so a
/// single unreadable calculation never aborts a batch.
pub fn read_optional(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read file");
            None
        }
    }
}

/// Writes content, creating parent directories as needed.
pub fn write_text(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_optional_distinguishes_missing_from_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.out");
        assert_eq!(read_optional(&path), None);

        write_text(&path, "hello").unwrap();
        assert_eq!(read_optional(&path).as_deref(), Some("hello"));
    }

    #[test]
    fn write_text_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x/y/z.in");
        write_text(&path, "content").unwrap();
        assert_eq!(read_optional(&path).as_deref(), Some("content"));
    }

    #[test]
    fn read_optional_is_lossy_on_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.out");
        std::fs::write(&path, [b'o', b'k', 0xFF, b'!']).unwrap();
        let text = read_optional(&path).unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
    }
}
