//! Destination naming that never overwrites an existing file.

use std::path::{Path, PathBuf};

/// Returns a path inside `destination_dir` for `file_name` that does not exist
/// at call time.
///
/// Tries `name.ext` first, then `name (1).ext`, `name (2).ext`, and so on.
/// Nothing is locked, so a concurrent writer can still claim the name between
/// this check and the move.
pub fn unique_path(destination_dir: &Path, file_name: &str) -> PathBuf {
    let candidate = destination_dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let suffix = match name.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => String::new(),
    };

    let mut counter: u64 = 1;
    loop {
        let candidate = destination_dir.join(format!("{} ({}){}", stem, counter, suffix));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_free_name_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = unique_path(temp_dir.path(), "report.pdf");
        assert_eq!(path, temp_dir.path().join("report.pdf"));
    }

    #[test]
    fn test_counter_increments() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::write(dir.join("report.pdf"), "a").expect("Failed to write file");
        let first = unique_path(dir, "report.pdf");
        assert_eq!(first, dir.join("report (1).pdf"));

        fs::write(&first, "b").expect("Failed to write file");
        assert_eq!(unique_path(dir, "report.pdf"), dir.join("report (2).pdf"));
    }

    #[test]
    fn test_name_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::write(dir.join("Makefile"), "all:").expect("Failed to write file");
        assert_eq!(unique_path(dir, "Makefile"), dir.join("Makefile (1)"));
    }

    #[test]
    fn test_only_last_extension_is_kept_as_suffix() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::write(dir.join("backup.tar.gz"), "x").expect("Failed to write file");
        assert_eq!(
            unique_path(dir, "backup.tar.gz"),
            dir.join("backup.tar (1).gz")
        );
    }

    #[test]
    fn test_missing_directory_returns_plain_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("PDF");
        assert_eq!(unique_path(&missing, "a.pdf"), missing.join("a.pdf"));
    }
}
