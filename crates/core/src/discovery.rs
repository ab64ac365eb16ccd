//! Finding and loading article files under `updates/{year}/{month}/`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::parser::{ArticleParser, ParseWarning};
use crate::types::ArticleRecord;

/// Find every `*.md` file in `root/YYYY/MM/`, sorted by path.
///
/// Directories that do not look like a four-digit year or a two-digit month
/// are skipped.
pub fn discover_articles(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::InputDirectory(root.to_path_buf()));
    }

    let year_dirs = numbered_dirs(root, 4).map_err(|e| {
        log::debug!("Cannot list {}: {}", root.display(), e);
        Error::InputDirectory(root.to_path_buf())
    })?;

    let mut files = Vec::new();
    for year_dir in year_dirs {
        for month_dir in numbered_dirs(&year_dir, 2)? {
            let entries = fs::read_dir(&month_dir).map_err(|e| Error::io(&month_dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| Error::io(&month_dir, e))?.path();
                let is_markdown = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("md"));
                if is_markdown && path.is_file() {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    log::debug!("Discovered {} article files under {}", files.len(), root.display());
    Ok(files)
}

/// Subdirectories whose names are exactly `digits` ASCII digits.
fn numbered_dirs(parent: &Path, digits: usize) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(parent).map_err(|e| Error::io(parent, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(parent, e))?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.len() == digits && n.bytes().all(|b| b.is_ascii_digit()));
        if matches && path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Outcome of parsing a batch of files.
///
/// Every file is attempted; failures never stop the remaining files.
#[derive(Debug, Default)]
pub struct Batch {
    /// Successfully parsed records, in input order.
    pub records: Vec<ArticleRecord>,
    /// Warnings per file.
    pub warnings: Vec<(PathBuf, ParseWarning)>,
    /// Unreadable or unparsable files.
    pub failures: Vec<Error>,
}

impl Batch {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read and parse every file.
pub fn parse_files(paths: &[PathBuf], parser: &ArticleParser) -> Batch {
    let mut batch = Batch::default();

    for path in paths {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                batch.failures.push(Error::io(path, e));
                continue;
            }
        };

        match parser.parse(&text) {
            Ok(parsed) => {
                log::debug!("Parsed {} ({})", path.display(), parsed.record.date);
                batch
                    .warnings
                    .extend(parsed.warnings.into_iter().map(|w| (path.clone(), w)));
                batch.records.push(parsed.record);
            }
            Err(kind) => batch.failures.push(Error::parse(path, kind)),
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn article(title: &str, date: &str) -> String {
        format!("# {}\n## Article Date\n{}\n## Article Url\nhttps://example.com/{}\n", title, date, date)
    }

    #[test]
    fn test_discover_year_month_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "2026/01/2026-01-20-b.md", "");
        write(root, "2026/01/2026-01-05-a.md", "");
        write(root, "2025/12/2025-12-30-z.MD", "");
        write(root, "2026/01/notes.txt", "");
        write(root, "drafts/01/2026-01-07-draft.md", "");
        write(root, "2026/1/2026-01-08-bad-month.md", "");
        write(root, "2026/01/nested/2026-01-09-deep.md", "");

        let files = discover_articles(root).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2025-12-30-z.MD", "2026-01-05-a.md", "2026-01-20-b.md"]);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_articles(&dir.path().join("updates")).unwrap_err();
        assert!(matches!(err, Error::InputDirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_is_an_input_directory_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("updates");
        fs::create_dir(&root).unwrap();
        fs::set_permissions(&root, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory.
        let listable = fs::read_dir(&root).is_ok();
        let result = discover_articles(&root);
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();
        if listable {
            return;
        }

        assert!(matches!(result.unwrap_err(), Error::InputDirectory(path) if path == root));
    }

    #[test]
    fn test_bad_file_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let good_a = write(root, "a.md", &article("A", "2026-01-05"));
        let bad = write(root, "b.md", "# B\n## Article Url\nhttps://example.com\n");
        let good_c = write(root, "c.md", &article("C", "2026-01-20"));

        let batch = parse_files(&[good_a, bad.clone(), good_c], &ArticleParser::new());

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[1].title, "C");
        assert_eq!(batch.failures.len(), 1);
        match &batch.failures[0] {
            Error::Parse { file, kind } => {
                assert_eq!(file, &bad);
                assert_eq!(kind, &ParseError::MissingDateSection);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!batch.is_clean());
    }

    #[test]
    fn test_unreadable_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let batch = parse_files(&[dir.path().join("missing.md")], &ArticleParser::new());
        assert!(matches!(batch.failures[0], Error::Io { .. }));
    }
}
