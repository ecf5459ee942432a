//! Hidden temporary files for in-flight downloads.
//!
//! A download is written to `.name.XXXXXX` next to its destination and only
//! renamed into place once complete. The [`TempFileGuard`] removes the
//! temporary file if the download fails or the guard is dropped early.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Characters used for the random suffix.
const RAND_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 6;

/// Maximum attempts to find an unused temporary name.
const MAX_OPEN_ATTEMPTS: u32 = 100;

/// Maximum filename component length (NAME_MAX on most POSIX systems).
pub(crate) const NAME_MAX: usize = 255;

/// Longest prefix of `text` that fits in `budget` bytes without splitting a
/// character.
pub(crate) fn truncate_to_fit(text: &str, budget: usize) -> &str {
    let mut end = text.len().min(budget);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Builds the `.name.` prefix for a destination, placed in the same directory.
fn tmpname_prefix(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map_or_else(|| "download".to_owned(), |n| n.to_string_lossy().into_owned());

    let stem = file_name.strip_prefix('.').unwrap_or(&file_name);
    let stem = truncate_to_fit(stem, NAME_MAX - SUFFIX_LEN - 2);

    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(".{stem}."))
}

/// Creates an empty hidden temporary file beside `dest` with `create_new`
/// semantics and returns a guard owning it.
pub(crate) fn reserve_tmpfile(dest: &Path) -> io::Result<TempFileGuard> {
    let prefix = tmpname_prefix(dest);

    for _ in 0..MAX_OPEN_ATTEMPTS {
        let mut candidate = prefix.clone().into_os_string();
        candidate.push(random_suffix()?);
        let candidate = PathBuf::from(candidate);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(TempFileGuard::new(candidate)),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "failed to create temp file after {MAX_OPEN_ATTEMPTS} attempts: {}XXXXXX",
            prefix.display()
        ),
    ))
}

fn random_suffix() -> io::Result<String> {
    let mut random_bytes = [0u8; SUFFIX_LEN];
    getrandom::fill(&mut random_bytes).map_err(io::Error::other)?;
    Ok(random_bytes
        .iter()
        .map(|&b| RAND_CHARS[usize::from(b) % RAND_CHARS.len()] as char)
        .collect())
}

/// RAII guard that deletes its temporary file on drop unless persisted.
#[derive(Debug)]
pub(crate) struct TempFileGuard {
    path: PathBuf,
    keep_on_drop: bool,
}

impl TempFileGuard {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self {
            path,
            keep_on_drop: false,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the temporary file over `dest`, replacing any file there.
    ///
    /// On failure the guard still owns the file and removes it on drop.
    pub(crate) fn persist(mut self, dest: &Path) -> io::Result<()> {
        fs::rename(&self.path, dest)?;
        self.keep_on_drop = true;
        Ok(())
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.keep_on_drop {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reserved_file_is_hidden_and_beside_destination() {
        let dir = tempdir().expect("tempdir");
        let dest = dir.path().join("report.csv");

        let guard = reserve_tmpfile(&dest).expect("reserve");
        let name = guard.path().file_name().unwrap().to_string_lossy().into_owned();

        assert!(name.starts_with(".report.csv."), "got: {name}");
        assert_eq!(name.len(), ".report.csv.".len() + SUFFIX_LEN);
        assert_eq!(guard.path().parent(), Some(dir.path()));
        assert!(guard.path().exists());
    }

    #[test]
    fn dotfile_does_not_get_double_dot() {
        let prefix = tmpname_prefix(Path::new("/share/.profile"));
        assert_eq!(prefix, PathBuf::from("/share/.profile."));
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let long = "é".repeat(200);
        let prefix = tmpname_prefix(&PathBuf::from("/share").join(&long));
        let name = prefix.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.len() + SUFFIX_LEN <= NAME_MAX);
    }

    #[test]
    fn dropped_guard_removes_file() {
        let dir = tempdir().expect("tempdir");
        let path = {
            let guard = reserve_tmpfile(&dir.path().join("a.txt")).expect("reserve");
            guard.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn persist_replaces_destination() {
        let dir = tempdir().expect("tempdir");
        let dest = dir.path().join("a.txt");
        fs::write(&dest, b"old").expect("seed");

        let guard = reserve_tmpfile(&dest).expect("reserve");
        fs::write(guard.path(), b"new").expect("write temp");
        let temp = guard.path().to_path_buf();
        guard.persist(&dest).expect("persist");

        assert_eq!(fs::read(&dest).unwrap(), b"new");
        assert!(!temp.exists());
    }
}
