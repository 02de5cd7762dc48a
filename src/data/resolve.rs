use std::io;
use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// NFC form of `text`.
pub fn nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Find the entry of `dir` whose name equals `target` after NFC
/// normalization of both sides.
///
/// Comparison is exact and case-sensitive. Returns `Ok(None)` when no
/// entry matches; only an unreadable directory is an error. Entries are
/// scanned in name order so the result is stable if two entries normalize
/// to the same name.
pub fn find_file(dir: &Path, target: &str) -> io::Result<Option<PathBuf>> {
    let target = nfc(target);
    Ok(sorted_entries(dir)?
        .into_iter()
        .find(|path| {
            path.file_name()
                .map(|name| nfc(&name.to_string_lossy()) == target)
                .unwrap_or(false)
        }))
}

/// All entries of `dir`, sorted by path.
pub(crate) fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "4개교_생육결과데이터.xlsx";

    fn nfd(text: &str) -> String {
        text.nfd().collect()
    }

    #[test]
    fn finds_nfd_entry_with_nfc_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(nfd(NAME)), b"x").unwrap();

        let found = find_file(dir.path(), &nfc(NAME)).unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn finds_nfc_entry_with_nfd_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(nfc(NAME)), b"x").unwrap();

        let found = find_file(dir.path(), &nfd(NAME)).unwrap();
        assert_eq!(found, Some(dir.path().join(nfc(NAME))));
    }

    #[test]
    fn absent_and_partial_names_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.xlsx"), b"x").unwrap();

        assert_eq!(find_file(dir.path(), NAME).unwrap(), None);
        assert_eq!(find_file(dir.path(), "data").unwrap(), None);
        assert_eq!(find_file(dir.path(), "DATA.xlsx").unwrap(), None);
    }

    #[test]
    fn unreadable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_file(&dir.path().join("missing"), NAME).is_err());
    }
}
