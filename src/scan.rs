//! Artifact scanner.
//!
//! Enumerates build-output files by extension in the working directory
//! (and, recursively, an optional build-output subdirectory) and reports
//! each file's byte size and modification time. Also knows how to wipe
//! artifacts, intermediate object files, and the dependency-cache file so
//! a measurement is always taken from a from-scratch build — stale
//! objects can produce misleadingly small or large artifacts.
//!
//! Artifact contents are never interpreted; size and mtime only.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

use crate::error::{Result, SizeError};

/// One build-output file as observed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the scanner's working directory; the key used in
    /// the persisted artifact maps.
    pub name: String,
    /// Absolute (working-dir joined) path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, unix seconds. Pre-epoch mtimes clamp to 0.
    pub mtime: i64,
}

/// Scanner over a working directory's build outputs.
#[derive(Debug, Clone)]
pub struct Scanner {
    dir: PathBuf,
    artifact_exts: Vec<String>,
    object_exts: Vec<String>,
    build_subdir: Option<PathBuf>,
    depend_file: String,
}

impl Scanner {
    /// A scanner with the stock configuration: `*.bin` artifacts, `*.o`
    /// intermediates, `.depend` dependency cache, no build subdirectory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            artifact_exts: vec!["bin".to_string()],
            object_exts: vec!["o".to_string()],
            build_subdir: None,
            depend_file: ".depend".to_string(),
        }
    }

    /// Replace the artifact extension list.
    pub fn artifact_exts(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.artifact_exts = exts.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the intermediate object-file extension list.
    pub fn object_exts(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.object_exts = exts.into_iter().map(Into::into).collect();
        self
    }

    /// Also scan (recursively) a build-output subdirectory.
    pub fn build_subdir(mut self, subdir: Option<impl Into<PathBuf>>) -> Self {
        self.build_subdir = subdir.map(Into::into);
        self
    }

    /// Rename the dependency-cache file (default `.depend`).
    pub fn depend_file(mut self, name: impl Into<String>) -> Self {
        self.depend_file = name.into();
        self
    }

    /// The scanner's working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Enumerate current artifacts, sorted by name.
    ///
    /// # Errors
    ///
    /// Fails on unreadable directories or file metadata; individual files
    /// vanishing between listing and stat are surfaced the same way.
    pub fn bin_files(&self) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for path in self.matching_files(&self.artifact_exts)? {
            artifacts.push(self.stat(path)?);
        }
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    /// Delete all artifacts, all intermediate object files, and the
    /// dependency cache. Missing files are not errors.
    pub fn clean(&self) -> Result<()> {
        for path in self.matching_files(&self.artifact_exts)? {
            remove_if_present(&path)?;
        }
        for path in self.matching_files(&self.object_exts)? {
            remove_if_present(&path)?;
        }
        self.remove_depend()
    }

    /// Delete the dependency-cache file alone. A stale cache refers to
    /// headers from another revision and breaks the rebuild.
    pub fn remove_depend(&self) -> Result<()> {
        remove_if_present(&self.dir.join(&self.depend_file))
    }

    fn stat(&self, path: PathBuf) -> Result<Artifact> {
        let metadata = fs::metadata(&path).map_err(|source| SizeError::IoError {
            path: path.clone(),
            source,
        })?;
        let mtime = metadata
            .modified()
            .map_err(|source| SizeError::IoError {
                path: path.clone(),
                source,
            })?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let name = path
            .strip_prefix(&self.dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();

        Ok(Artifact {
            name,
            path,
            size: metadata.len(),
            mtime,
        })
    }

    /// Files with one of `exts` in the working dir, plus the build
    /// subdirectory walked recursively.
    fn matching_files(&self, exts: &[String]) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        let entries = fs::read_dir(&self.dir).map_err(|source| SizeError::IoError {
            path: self.dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| SizeError::IoError {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && has_ext(&path, exts) {
                found.push(path);
            }
        }

        if let Some(subdir) = &self.build_subdir {
            let subdir = self.dir.join(subdir);
            if subdir.is_dir() {
                for entry in WalkDir::new(&subdir).into_iter().filter_map(|e| e.ok()) {
                    let path = entry.into_path();
                    if path.is_file() && has_ext(&path, exts) {
                        found.push(path);
                    }
                }
            }
        }

        Ok(found)
    }
}

fn has_ext(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|want| want == e))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SizeError::IoError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &Path, name: &str, len: usize) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn bin_files_reports_sizes_sorted_by_name() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "blink.bin", 120);
        touch(tmp.path(), "app.bin", 100);
        touch(tmp.path(), "notes.txt", 10);

        let scanner = Scanner::new(tmp.path());
        let artifacts = scanner.bin_files().unwrap();
        let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["app.bin", "blink.bin"]);
        assert_eq!(artifacts[0].size, 100);
        assert_eq!(artifacts[1].size, 120);
        assert!(artifacts[0].mtime > 0);
    }

    #[test]
    fn bin_files_walks_build_subdir_recursively() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.bin", 1);
        touch(tmp.path(), "build/nested/deep.bin", 2);
        touch(tmp.path(), "elsewhere/skipped.bin", 3);

        let scanner = Scanner::new(tmp.path()).build_subdir(Some("build"));
        let names: Vec<String> = scanner
            .bin_files()
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["build/nested/deep.bin", "top.bin"]);
    }

    #[test]
    fn mtime_reflects_filesystem_time() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "app.bin", 1);
        let when = filetime::FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_mtime(tmp.path().join("app.bin"), when).unwrap();

        let artifacts = Scanner::new(tmp.path()).bin_files().unwrap();
        assert_eq!(artifacts[0].mtime, 1_700_000_000);
    }

    #[test]
    fn clean_removes_artifacts_objects_and_depend() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "app.bin", 4);
        touch(tmp.path(), "app.o", 4);
        touch(tmp.path(), ".depend", 4);
        touch(tmp.path(), "main.c", 4);

        let scanner = Scanner::new(tmp.path());
        scanner.clean().unwrap();

        assert!(!tmp.path().join("app.bin").exists());
        assert!(!tmp.path().join("app.o").exists());
        assert!(!tmp.path().join(".depend").exists());
        assert!(tmp.path().join("main.c").exists());
    }

    #[test]
    fn clean_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let scanner = Scanner::new(tmp.path());
        scanner.clean().unwrap();
        scanner.clean().unwrap();
    }

    #[test]
    fn custom_extensions_are_respected() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "firmware.hex", 9);
        touch(tmp.path(), "firmware.bin", 9);

        let scanner = Scanner::new(tmp.path()).artifact_exts(["hex"]);
        let names: Vec<String> = scanner
            .bin_files()
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["firmware.hex"]);
    }
}
